// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

/// Per-group accumulator for keyed-extremal aggregates: the payload paired
/// with the smallest (first) or largest (last) ordering key seen so far.
///
/// While `has_value` is false the payload is meaningless and `key` holds the
/// direction sentinel (`i64::MAX` for first, `i64::MIN` for last), so any
/// real key compares as an improvement.
#[derive(Clone, Copy, Debug)]
pub(super) struct KeyedState<T: Copy> {
    pub(super) value: T,
    pub(super) key: i64,
    pub(super) has_value: bool,
}

impl<T: Copy + Default> KeyedState<T> {
    pub(super) fn empty(sentinel_key: i64) -> Self {
        Self {
            value: T::default(),
            key: sentinel_key,
            has_value: false,
        }
    }

    /// Row-at-a-time transition: adopt `(value, key)` when the state is
    /// empty or the key strictly beats the held one. The strict comparison
    /// means the row seen first wins an exact key tie.
    pub(super) fn accumulate(&mut self, value: T, key: i64, keep_smallest: bool) {
        let beats = if keep_smallest {
            key < self.key
        } else {
            key > self.key
        };
        if !self.has_value || beats {
            self.value = value;
            self.key = key;
            self.has_value = true;
        }
    }

    /// Cross-partition fold. An empty target adopts the source wholesale;
    /// otherwise the source wins only on a strictly better key, so the
    /// target keeps exact ties regardless of which partition it came from.
    pub(super) fn combine(&mut self, source: &Self, keep_smallest: bool) {
        if !self.has_value {
            *self = *source;
            return;
        }
        if !source.has_value {
            return;
        }
        let beats = if keep_smallest {
            source.key < self.key
        } else {
            source.key > self.key
        };
        if beats {
            self.value = source.value;
            self.key = source.key;
        }
    }
}

pub(super) type KeyedI16State = KeyedState<i16>;
pub(super) type KeyedI32State = KeyedState<i32>;
pub(super) type KeyedI64State = KeyedState<i64>;
pub(super) type KeyedU64State = KeyedState<u64>;
pub(super) type KeyedI128State = KeyedState<i128>;
pub(super) type KeyedF64State = KeyedState<f64>;
