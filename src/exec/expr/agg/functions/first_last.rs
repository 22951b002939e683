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
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BinaryArray, BinaryBuilder};
use arrow::datatypes::DataType;

use crate::common::largeint;
use crate::exec::node::aggregate::AggFunction;

use super::super::*;
use super::AggregateFunction;
use super::common::{AggScalarValue, build_scalar_array};

/// `first_s(value, key)` / `last_s(value, key)`: the value paired with the
/// smallest / largest ordering key observed in the group.
pub(super) struct FirstLastAgg;

fn is_first_kind(kind: &AggKind) -> bool {
    matches!(
        kind,
        AggKind::FirstInt
            | AggKind::FirstUInt
            | AggKind::FirstFloat
            | AggKind::FirstLargeInt
            | AggKind::FirstDecimal16
            | AggKind::FirstDecimal32
            | AggKind::FirstDecimal64
            | AggKind::FirstDecimal128
    )
}

/// Key held by an empty state; any real key compares as an improvement.
fn sentinel_key(kind: &AggKind) -> i64 {
    if is_first_kind(kind) {
        i64::MAX
    } else {
        i64::MIN
    }
}

fn family_name(first: bool) -> &'static str {
    if first { "first_s" } else { "last_s" }
}

fn kind_for_value_type(first: bool, data_type: &DataType) -> Result<AggKind, String> {
    let kind = match data_type {
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            if first {
                AggKind::FirstInt
            } else {
                AggKind::LastInt
            }
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            if first {
                AggKind::FirstUInt
            } else {
                AggKind::LastUInt
            }
        }
        DataType::Float32 | DataType::Float64 => {
            if first {
                AggKind::FirstFloat
            } else {
                AggKind::LastFloat
            }
        }
        dt if largeint::is_largeint_type(dt) => {
            if first {
                AggKind::FirstLargeInt
            } else {
                AggKind::LastLargeInt
            }
        }
        DataType::Decimal128(_, _) => {
            if first {
                AggKind::FirstDecimal128
            } else {
                AggKind::LastDecimal128
            }
        }
        other => {
            return Err(format!(
                "{} only accepts numeric inputs, got {:?}",
                family_name(first),
                other
            ));
        }
    };
    Ok(kind)
}

/// Pick the kernel for a payload type: the generic (widest) kind first,
/// then the decimal narrowing pass.
fn resolve_kind(first: bool, value_type: &DataType) -> Result<AggKind, String> {
    let kind = kind_for_value_type(first, value_type)?;
    match decimal_width_for_type(value_type) {
        Some(width) => Ok(narrow_decimal_kind(kind, width)),
        None => Ok(kind),
    }
}

const PARTIAL_TAG_INT: u8 = 1;
const PARTIAL_TAG_UINT: u8 = 2;
const PARTIAL_TAG_FLOAT: u8 = 3;
const PARTIAL_TAG_LARGEINT: u8 = 4;
const PARTIAL_TAG_DECIMAL16: u8 = 5;
const PARTIAL_TAG_DECIMAL32: u8 = 6;
const PARTIAL_TAG_DECIMAL64: u8 = 7;
const PARTIAL_TAG_DECIMAL128: u8 = 8;

fn partial_tag(kind: &AggKind) -> u8 {
    match kind {
        AggKind::FirstInt | AggKind::LastInt => PARTIAL_TAG_INT,
        AggKind::FirstUInt | AggKind::LastUInt => PARTIAL_TAG_UINT,
        AggKind::FirstFloat | AggKind::LastFloat => PARTIAL_TAG_FLOAT,
        AggKind::FirstLargeInt | AggKind::LastLargeInt => PARTIAL_TAG_LARGEINT,
        AggKind::FirstDecimal16 | AggKind::LastDecimal16 => PARTIAL_TAG_DECIMAL16,
        AggKind::FirstDecimal32 | AggKind::LastDecimal32 => PARTIAL_TAG_DECIMAL32,
        AggKind::FirstDecimal64 | AggKind::LastDecimal64 => PARTIAL_TAG_DECIMAL64,
        AggKind::FirstDecimal128 | AggKind::LastDecimal128 => PARTIAL_TAG_DECIMAL128,
    }
}

/// Serialized partial state: `[tag][key: i64 LE][value: LE at state width]`.
fn encode_partial(tag: u8, key: i64, value_bytes: &[u8], buf: &mut Vec<u8>) {
    buf.push(tag);
    buf.extend_from_slice(&key.to_le_bytes());
    buf.extend_from_slice(value_bytes);
}

fn decode_partial<'a>(
    bytes: &'a [u8],
    expected_tag: u8,
    value_width: usize,
) -> Result<(i64, &'a [u8]), String> {
    if bytes.len() != 1 + 8 + value_width {
        return Err(format!(
            "first/last partial state length mismatch: expected {}, got {}",
            1 + 8 + value_width,
            bytes.len()
        ));
    }
    if bytes[0] != expected_tag {
        return Err(format!(
            "first/last partial state tag mismatch: expected {}, got {}",
            expected_tag, bytes[0]
        ));
    }
    let key = i64::from_le_bytes(bytes[1..9].try_into().unwrap());
    Ok((key, &bytes[9..]))
}

impl AggregateFunction for FirstLastAgg {
    fn build_spec_from_type(
        &self,
        func: &AggFunction,
        input_type: Option<&DataType>,
        input_is_intermediate: bool,
    ) -> Result<AggSpec, String> {
        let first = match func.name.as_str() {
            "first_s" => true,
            "last_s" => false,
            other => return Err(format!("unsupported first/last aggregate: {}", other)),
        };
        let data_type =
            input_type.ok_or_else(|| format!("{} input type missing", func.name))?;

        if input_is_intermediate {
            let sig = super::super::agg_type_signature(func)
                .ok_or_else(|| format!("{} type signature missing", func.name))?;
            let output_type = sig
                .output_type
                .as_ref()
                .ok_or_else(|| format!("{} output type signature missing", func.name))?;
            return Ok(AggSpec {
                kind: resolve_kind(first, output_type)?,
                output_type: output_type.clone(),
                intermediate_type: data_type.clone(),
                input_arg_type: sig.input_arg_type.clone(),
            });
        }

        match data_type {
            DataType::Struct(fields) => {
                if fields.len() != 2 {
                    return Err(format!("{} expects 2 arguments", func.name));
                }
                let value_type = fields[0].data_type();
                let key_type = fields[1].data_type();
                if !is_ordering_key_type(key_type) {
                    return Err(format!(
                        "{} ordering key must be BIGINT or TIMESTAMP, got {:?}",
                        func.name, key_type
                    ));
                }
                Ok(AggSpec {
                    kind: resolve_kind(first, value_type)?,
                    output_type: value_type.clone(),
                    intermediate_type: DataType::Binary,
                    input_arg_type: None,
                })
            }
            other => Err(format!(
                "{} expects struct input, got {:?}",
                func.name, other
            )),
        }
    }

    fn state_layout_for(&self, kind: &AggKind) -> (usize, usize) {
        match kind {
            AggKind::FirstInt
            | AggKind::LastInt
            | AggKind::FirstDecimal64
            | AggKind::LastDecimal64 => (
                std::mem::size_of::<KeyedI64State>(),
                std::mem::align_of::<KeyedI64State>(),
            ),
            AggKind::FirstUInt | AggKind::LastUInt => (
                std::mem::size_of::<KeyedU64State>(),
                std::mem::align_of::<KeyedU64State>(),
            ),
            AggKind::FirstFloat | AggKind::LastFloat => (
                std::mem::size_of::<KeyedF64State>(),
                std::mem::align_of::<KeyedF64State>(),
            ),
            AggKind::FirstLargeInt
            | AggKind::LastLargeInt
            | AggKind::FirstDecimal128
            | AggKind::LastDecimal128 => (
                std::mem::size_of::<KeyedI128State>(),
                std::mem::align_of::<KeyedI128State>(),
            ),
            AggKind::FirstDecimal16 | AggKind::LastDecimal16 => (
                std::mem::size_of::<KeyedI16State>(),
                std::mem::align_of::<KeyedI16State>(),
            ),
            AggKind::FirstDecimal32 | AggKind::LastDecimal32 => (
                std::mem::size_of::<KeyedI32State>(),
                std::mem::align_of::<KeyedI32State>(),
            ),
        }
    }

    fn build_input_view<'a>(
        &self,
        _spec: &AggSpec,
        array: &'a Option<ArrayRef>,
    ) -> Result<AggInputView<'a>, String> {
        let arr = array
            .as_ref()
            .ok_or_else(|| "first/last input missing".to_string())?;
        Ok(AggInputView::Pair(PairView::from_struct(arr)?))
    }

    fn build_merge_view<'a>(
        &self,
        _spec: &AggSpec,
        array: &'a Option<ArrayRef>,
    ) -> Result<AggInputView<'a>, String> {
        let arr = array
            .as_ref()
            .ok_or_else(|| "first/last merge input missing".to_string())?;
        let bin = arr
            .as_any()
            .downcast_ref::<BinaryArray>()
            .ok_or_else(|| "failed to downcast to BinaryArray".to_string())?;
        Ok(AggInputView::Binary(bin))
    }

    fn init_state(&self, spec: &AggSpec, ptr: *mut u8) {
        let sentinel = sentinel_key(&spec.kind);
        match spec.kind {
            AggKind::FirstInt
            | AggKind::LastInt
            | AggKind::FirstDecimal64
            | AggKind::LastDecimal64 => unsafe {
                std::ptr::write(ptr as *mut KeyedI64State, KeyedI64State::empty(sentinel));
            },
            AggKind::FirstUInt | AggKind::LastUInt => unsafe {
                std::ptr::write(ptr as *mut KeyedU64State, KeyedU64State::empty(sentinel));
            },
            AggKind::FirstFloat | AggKind::LastFloat => unsafe {
                std::ptr::write(ptr as *mut KeyedF64State, KeyedF64State::empty(sentinel));
            },
            AggKind::FirstLargeInt
            | AggKind::LastLargeInt
            | AggKind::FirstDecimal128
            | AggKind::LastDecimal128 => unsafe {
                std::ptr::write(ptr as *mut KeyedI128State, KeyedI128State::empty(sentinel));
            },
            AggKind::FirstDecimal16 | AggKind::LastDecimal16 => unsafe {
                std::ptr::write(ptr as *mut KeyedI16State, KeyedI16State::empty(sentinel));
            },
            AggKind::FirstDecimal32 | AggKind::LastDecimal32 => unsafe {
                std::ptr::write(ptr as *mut KeyedI32State, KeyedI32State::empty(sentinel));
            },
        }
    }

    fn drop_state(&self, _spec: &AggSpec, _ptr: *mut u8) {
        // All keyed states are Copy scalars; nothing owns heap memory.
    }

    fn update_batch(
        &self,
        spec: &AggSpec,
        offset: usize,
        state_ptrs: &[AggStatePtr],
        input: &AggInputView,
    ) -> Result<(), String> {
        let AggInputView::Pair(pair) = input else {
            return Err("first/last batch input type mismatch".to_string());
        };
        let keep_smallest = is_first_kind(&spec.kind);
        match spec.kind {
            AggKind::FirstInt | AggKind::LastInt => {
                update_int(offset, state_ptrs, pair, keep_smallest)
            }
            AggKind::FirstUInt | AggKind::LastUInt => {
                update_uint(offset, state_ptrs, pair, keep_smallest)
            }
            AggKind::FirstFloat | AggKind::LastFloat => {
                update_float(offset, state_ptrs, pair, keep_smallest)
            }
            AggKind::FirstLargeInt | AggKind::LastLargeInt => {
                update_largeint(offset, state_ptrs, pair, keep_smallest)
            }
            AggKind::FirstDecimal16 | AggKind::LastDecimal16 => {
                update_decimal16(offset, state_ptrs, pair, keep_smallest)
            }
            AggKind::FirstDecimal32 | AggKind::LastDecimal32 => {
                update_decimal32(offset, state_ptrs, pair, keep_smallest)
            }
            AggKind::FirstDecimal64 | AggKind::LastDecimal64 => {
                update_decimal64(offset, state_ptrs, pair, keep_smallest)
            }
            AggKind::FirstDecimal128 | AggKind::LastDecimal128 => {
                update_decimal128(offset, state_ptrs, pair, keep_smallest)
            }
        }
    }

    fn merge_batch(
        &self,
        spec: &AggSpec,
        offset: usize,
        state_ptrs: &[AggStatePtr],
        input: &AggInputView,
    ) -> Result<(), String> {
        let AggInputView::Binary(arr) = input else {
            return Err("first/last merge input type mismatch".to_string());
        };
        let keep_smallest = is_first_kind(&spec.kind);
        match spec.kind {
            AggKind::FirstInt | AggKind::LastInt => {
                merge_int(offset, state_ptrs, arr, keep_smallest)
            }
            AggKind::FirstUInt | AggKind::LastUInt => {
                merge_uint(offset, state_ptrs, arr, keep_smallest)
            }
            AggKind::FirstFloat | AggKind::LastFloat => {
                merge_float(offset, state_ptrs, arr, keep_smallest)
            }
            AggKind::FirstLargeInt | AggKind::LastLargeInt => {
                merge_i128(offset, state_ptrs, arr, keep_smallest, PARTIAL_TAG_LARGEINT)
            }
            AggKind::FirstDecimal16 | AggKind::LastDecimal16 => {
                merge_decimal16(offset, state_ptrs, arr, keep_smallest)
            }
            AggKind::FirstDecimal32 | AggKind::LastDecimal32 => {
                merge_decimal32(offset, state_ptrs, arr, keep_smallest)
            }
            AggKind::FirstDecimal64 | AggKind::LastDecimal64 => {
                merge_decimal64(offset, state_ptrs, arr, keep_smallest)
            }
            AggKind::FirstDecimal128 | AggKind::LastDecimal128 => {
                merge_i128(offset, state_ptrs, arr, keep_smallest, PARTIAL_TAG_DECIMAL128)
            }
        }
    }

    fn build_array(
        &self,
        spec: &AggSpec,
        offset: usize,
        group_states: &[AggStatePtr],
        output_intermediate: bool,
    ) -> Result<ArrayRef, String> {
        if output_intermediate {
            return build_partial_array(spec, offset, group_states);
        }
        let mut values = Vec::with_capacity(group_states.len());
        match spec.kind {
            AggKind::FirstInt | AggKind::LastInt => {
                for &base in group_states {
                    let state =
                        unsafe { &*((base as *mut u8).add(offset) as *const KeyedI64State) };
                    values.push(state.has_value.then(|| AggScalarValue::Int64(state.value)));
                }
            }
            AggKind::FirstUInt | AggKind::LastUInt => {
                for &base in group_states {
                    let state =
                        unsafe { &*((base as *mut u8).add(offset) as *const KeyedU64State) };
                    values.push(state.has_value.then(|| AggScalarValue::UInt64(state.value)));
                }
            }
            AggKind::FirstFloat | AggKind::LastFloat => {
                for &base in group_states {
                    let state =
                        unsafe { &*((base as *mut u8).add(offset) as *const KeyedF64State) };
                    values.push(state.has_value.then(|| AggScalarValue::Float64(state.value)));
                }
            }
            AggKind::FirstLargeInt | AggKind::LastLargeInt => {
                for &base in group_states {
                    let state =
                        unsafe { &*((base as *mut u8).add(offset) as *const KeyedI128State) };
                    values.push(state.has_value.then(|| AggScalarValue::LargeInt(state.value)));
                }
            }
            AggKind::FirstDecimal16 | AggKind::LastDecimal16 => {
                for &base in group_states {
                    let state =
                        unsafe { &*((base as *mut u8).add(offset) as *const KeyedI16State) };
                    values.push(
                        state
                            .has_value
                            .then(|| AggScalarValue::Decimal128(state.value as i128)),
                    );
                }
            }
            AggKind::FirstDecimal32 | AggKind::LastDecimal32 => {
                for &base in group_states {
                    let state =
                        unsafe { &*((base as *mut u8).add(offset) as *const KeyedI32State) };
                    values.push(
                        state
                            .has_value
                            .then(|| AggScalarValue::Decimal128(state.value as i128)),
                    );
                }
            }
            AggKind::FirstDecimal64 | AggKind::LastDecimal64 => {
                for &base in group_states {
                    let state =
                        unsafe { &*((base as *mut u8).add(offset) as *const KeyedI64State) };
                    values.push(
                        state
                            .has_value
                            .then(|| AggScalarValue::Decimal128(state.value as i128)),
                    );
                }
            }
            AggKind::FirstDecimal128 | AggKind::LastDecimal128 => {
                for &base in group_states {
                    let state =
                        unsafe { &*((base as *mut u8).add(offset) as *const KeyedI128State) };
                    values.push(
                        state
                            .has_value
                            .then(|| AggScalarValue::Decimal128(state.value)),
                    );
                }
            }
        }
        build_scalar_array(&spec.output_type, values)
    }
}

fn update_int(
    offset: usize,
    state_ptrs: &[AggStatePtr],
    pair: &PairView,
    keep_smallest: bool,
) -> Result<(), String> {
    let PayloadArrayView::Int(values) = &pair.values else {
        return Err("first/last int payload type mismatch".to_string());
    };
    for (row, &base) in state_ptrs.iter().enumerate() {
        let Some(key) = pair.keys.value_at(row) else {
            continue;
        };
        let Some(value) = values.value_at(row) else {
            continue;
        };
        let state = unsafe { &mut *((base as *mut u8).add(offset) as *mut KeyedI64State) };
        state.accumulate(value, key, keep_smallest);
    }
    Ok(())
}

fn update_uint(
    offset: usize,
    state_ptrs: &[AggStatePtr],
    pair: &PairView,
    keep_smallest: bool,
) -> Result<(), String> {
    let PayloadArrayView::UInt(values) = &pair.values else {
        return Err("first/last uint payload type mismatch".to_string());
    };
    for (row, &base) in state_ptrs.iter().enumerate() {
        let Some(key) = pair.keys.value_at(row) else {
            continue;
        };
        let Some(value) = values.value_at(row) else {
            continue;
        };
        let state = unsafe { &mut *((base as *mut u8).add(offset) as *mut KeyedU64State) };
        state.accumulate(value, key, keep_smallest);
    }
    Ok(())
}

fn update_float(
    offset: usize,
    state_ptrs: &[AggStatePtr],
    pair: &PairView,
    keep_smallest: bool,
) -> Result<(), String> {
    let PayloadArrayView::Float(values) = &pair.values else {
        return Err("first/last float payload type mismatch".to_string());
    };
    for (row, &base) in state_ptrs.iter().enumerate() {
        let Some(key) = pair.keys.value_at(row) else {
            continue;
        };
        let Some(value) = values.value_at(row) else {
            continue;
        };
        let state = unsafe { &mut *((base as *mut u8).add(offset) as *mut KeyedF64State) };
        state.accumulate(value, key, keep_smallest);
    }
    Ok(())
}

fn update_largeint(
    offset: usize,
    state_ptrs: &[AggStatePtr],
    pair: &PairView,
    keep_smallest: bool,
) -> Result<(), String> {
    let PayloadArrayView::LargeInt(arr) = &pair.values else {
        return Err("first/last largeint payload type mismatch".to_string());
    };
    for (row, &base) in state_ptrs.iter().enumerate() {
        let Some(key) = pair.keys.value_at(row) else {
            continue;
        };
        if arr.is_null(row) {
            continue;
        }
        let value = largeint::value_at(arr, row)?;
        let state = unsafe { &mut *((base as *mut u8).add(offset) as *mut KeyedI128State) };
        state.accumulate(value, key, keep_smallest);
    }
    Ok(())
}

// The narrow decimal kernels store the unscaled value at the physical
// width selected from the declared precision, so the casts cannot lose
// digits.

fn update_decimal16(
    offset: usize,
    state_ptrs: &[AggStatePtr],
    pair: &PairView,
    keep_smallest: bool,
) -> Result<(), String> {
    let PayloadArrayView::Decimal128(arr) = &pair.values else {
        return Err("first/last decimal payload type mismatch".to_string());
    };
    for (row, &base) in state_ptrs.iter().enumerate() {
        let Some(key) = pair.keys.value_at(row) else {
            continue;
        };
        if arr.is_null(row) {
            continue;
        }
        let value = arr.value(row) as i16;
        let state = unsafe { &mut *((base as *mut u8).add(offset) as *mut KeyedI16State) };
        state.accumulate(value, key, keep_smallest);
    }
    Ok(())
}

fn update_decimal32(
    offset: usize,
    state_ptrs: &[AggStatePtr],
    pair: &PairView,
    keep_smallest: bool,
) -> Result<(), String> {
    let PayloadArrayView::Decimal128(arr) = &pair.values else {
        return Err("first/last decimal payload type mismatch".to_string());
    };
    for (row, &base) in state_ptrs.iter().enumerate() {
        let Some(key) = pair.keys.value_at(row) else {
            continue;
        };
        if arr.is_null(row) {
            continue;
        }
        let value = arr.value(row) as i32;
        let state = unsafe { &mut *((base as *mut u8).add(offset) as *mut KeyedI32State) };
        state.accumulate(value, key, keep_smallest);
    }
    Ok(())
}

fn update_decimal64(
    offset: usize,
    state_ptrs: &[AggStatePtr],
    pair: &PairView,
    keep_smallest: bool,
) -> Result<(), String> {
    let PayloadArrayView::Decimal128(arr) = &pair.values else {
        return Err("first/last decimal payload type mismatch".to_string());
    };
    for (row, &base) in state_ptrs.iter().enumerate() {
        let Some(key) = pair.keys.value_at(row) else {
            continue;
        };
        if arr.is_null(row) {
            continue;
        }
        let value = arr.value(row) as i64;
        let state = unsafe { &mut *((base as *mut u8).add(offset) as *mut KeyedI64State) };
        state.accumulate(value, key, keep_smallest);
    }
    Ok(())
}

fn update_decimal128(
    offset: usize,
    state_ptrs: &[AggStatePtr],
    pair: &PairView,
    keep_smallest: bool,
) -> Result<(), String> {
    let PayloadArrayView::Decimal128(arr) = &pair.values else {
        return Err("first/last decimal payload type mismatch".to_string());
    };
    for (row, &base) in state_ptrs.iter().enumerate() {
        let Some(key) = pair.keys.value_at(row) else {
            continue;
        };
        if arr.is_null(row) {
            continue;
        }
        let value = arr.value(row);
        let state = unsafe { &mut *((base as *mut u8).add(offset) as *mut KeyedI128State) };
        state.accumulate(value, key, keep_smallest);
    }
    Ok(())
}

fn merge_int(
    offset: usize,
    state_ptrs: &[AggStatePtr],
    arr: &BinaryArray,
    keep_smallest: bool,
) -> Result<(), String> {
    for (row, &base) in state_ptrs.iter().enumerate() {
        if arr.is_null(row) {
            continue;
        }
        let (key, value_bytes) = decode_partial(arr.value(row), PARTIAL_TAG_INT, 8)?;
        let source = KeyedI64State {
            value: i64::from_le_bytes(value_bytes.try_into().unwrap()),
            key,
            has_value: true,
        };
        let state = unsafe { &mut *((base as *mut u8).add(offset) as *mut KeyedI64State) };
        state.combine(&source, keep_smallest);
    }
    Ok(())
}

fn merge_uint(
    offset: usize,
    state_ptrs: &[AggStatePtr],
    arr: &BinaryArray,
    keep_smallest: bool,
) -> Result<(), String> {
    for (row, &base) in state_ptrs.iter().enumerate() {
        if arr.is_null(row) {
            continue;
        }
        let (key, value_bytes) = decode_partial(arr.value(row), PARTIAL_TAG_UINT, 8)?;
        let source = KeyedU64State {
            value: u64::from_le_bytes(value_bytes.try_into().unwrap()),
            key,
            has_value: true,
        };
        let state = unsafe { &mut *((base as *mut u8).add(offset) as *mut KeyedU64State) };
        state.combine(&source, keep_smallest);
    }
    Ok(())
}

fn merge_float(
    offset: usize,
    state_ptrs: &[AggStatePtr],
    arr: &BinaryArray,
    keep_smallest: bool,
) -> Result<(), String> {
    for (row, &base) in state_ptrs.iter().enumerate() {
        if arr.is_null(row) {
            continue;
        }
        let (key, value_bytes) = decode_partial(arr.value(row), PARTIAL_TAG_FLOAT, 8)?;
        let source = KeyedF64State {
            value: f64::from_le_bytes(value_bytes.try_into().unwrap()),
            key,
            has_value: true,
        };
        let state = unsafe { &mut *((base as *mut u8).add(offset) as *mut KeyedF64State) };
        state.combine(&source, keep_smallest);
    }
    Ok(())
}

fn merge_i128(
    offset: usize,
    state_ptrs: &[AggStatePtr],
    arr: &BinaryArray,
    keep_smallest: bool,
    tag: u8,
) -> Result<(), String> {
    for (row, &base) in state_ptrs.iter().enumerate() {
        if arr.is_null(row) {
            continue;
        }
        let (key, value_bytes) = decode_partial(arr.value(row), tag, 16)?;
        let source = KeyedI128State {
            value: i128::from_le_bytes(value_bytes.try_into().unwrap()),
            key,
            has_value: true,
        };
        let state = unsafe { &mut *((base as *mut u8).add(offset) as *mut KeyedI128State) };
        state.combine(&source, keep_smallest);
    }
    Ok(())
}

fn merge_decimal16(
    offset: usize,
    state_ptrs: &[AggStatePtr],
    arr: &BinaryArray,
    keep_smallest: bool,
) -> Result<(), String> {
    for (row, &base) in state_ptrs.iter().enumerate() {
        if arr.is_null(row) {
            continue;
        }
        let (key, value_bytes) = decode_partial(arr.value(row), PARTIAL_TAG_DECIMAL16, 2)?;
        let source = KeyedI16State {
            value: i16::from_le_bytes(value_bytes.try_into().unwrap()),
            key,
            has_value: true,
        };
        let state = unsafe { &mut *((base as *mut u8).add(offset) as *mut KeyedI16State) };
        state.combine(&source, keep_smallest);
    }
    Ok(())
}

fn merge_decimal32(
    offset: usize,
    state_ptrs: &[AggStatePtr],
    arr: &BinaryArray,
    keep_smallest: bool,
) -> Result<(), String> {
    for (row, &base) in state_ptrs.iter().enumerate() {
        if arr.is_null(row) {
            continue;
        }
        let (key, value_bytes) = decode_partial(arr.value(row), PARTIAL_TAG_DECIMAL32, 4)?;
        let source = KeyedI32State {
            value: i32::from_le_bytes(value_bytes.try_into().unwrap()),
            key,
            has_value: true,
        };
        let state = unsafe { &mut *((base as *mut u8).add(offset) as *mut KeyedI32State) };
        state.combine(&source, keep_smallest);
    }
    Ok(())
}

fn merge_decimal64(
    offset: usize,
    state_ptrs: &[AggStatePtr],
    arr: &BinaryArray,
    keep_smallest: bool,
) -> Result<(), String> {
    for (row, &base) in state_ptrs.iter().enumerate() {
        if arr.is_null(row) {
            continue;
        }
        let (key, value_bytes) = decode_partial(arr.value(row), PARTIAL_TAG_DECIMAL64, 8)?;
        let source = KeyedI64State {
            value: i64::from_le_bytes(value_bytes.try_into().unwrap()),
            key,
            has_value: true,
        };
        let state = unsafe { &mut *((base as *mut u8).add(offset) as *mut KeyedI64State) };
        state.combine(&source, keep_smallest);
    }
    Ok(())
}

fn build_partial_array(
    spec: &AggSpec,
    offset: usize,
    group_states: &[AggStatePtr],
) -> Result<ArrayRef, String> {
    let tag = partial_tag(&spec.kind);
    let mut builder = BinaryBuilder::new();
    for &base in group_states {
        let mut buf = Vec::with_capacity(1 + 8 + 16);
        let has_value = match spec.kind {
            AggKind::FirstInt
            | AggKind::LastInt
            | AggKind::FirstDecimal64
            | AggKind::LastDecimal64 => {
                let state = unsafe { &*((base as *mut u8).add(offset) as *const KeyedI64State) };
                if state.has_value {
                    encode_partial(tag, state.key, &state.value.to_le_bytes(), &mut buf);
                }
                state.has_value
            }
            AggKind::FirstUInt | AggKind::LastUInt => {
                let state = unsafe { &*((base as *mut u8).add(offset) as *const KeyedU64State) };
                if state.has_value {
                    encode_partial(tag, state.key, &state.value.to_le_bytes(), &mut buf);
                }
                state.has_value
            }
            AggKind::FirstFloat | AggKind::LastFloat => {
                let state = unsafe { &*((base as *mut u8).add(offset) as *const KeyedF64State) };
                if state.has_value {
                    encode_partial(tag, state.key, &state.value.to_le_bytes(), &mut buf);
                }
                state.has_value
            }
            AggKind::FirstLargeInt
            | AggKind::LastLargeInt
            | AggKind::FirstDecimal128
            | AggKind::LastDecimal128 => {
                let state = unsafe { &*((base as *mut u8).add(offset) as *const KeyedI128State) };
                if state.has_value {
                    encode_partial(tag, state.key, &state.value.to_le_bytes(), &mut buf);
                }
                state.has_value
            }
            AggKind::FirstDecimal16 | AggKind::LastDecimal16 => {
                let state = unsafe { &*((base as *mut u8).add(offset) as *const KeyedI16State) };
                if state.has_value {
                    encode_partial(tag, state.key, &state.value.to_le_bytes(), &mut buf);
                }
                state.has_value
            }
            AggKind::FirstDecimal32 | AggKind::LastDecimal32 => {
                let state = unsafe { &*((base as *mut u8).add(offset) as *const KeyedI32State) };
                if state.has_value {
                    encode_partial(tag, state.key, &state.value.to_le_bytes(), &mut buf);
                }
                state.has_value
            }
        };
        if has_value {
            builder.append_value(&buf);
        } else {
            builder.append_null();
        }
    }
    Ok(Arc::new(builder.finish()))
}
