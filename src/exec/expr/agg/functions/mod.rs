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
use arrow::array::ArrayRef;
use arrow::datatypes::DataType;

use crate::exec::node::aggregate::AggFunction;

use super::{AggInputView, AggSpec, AggStatePtr};

/// Concrete kernel selection for one bound aggregate. The decimal variants
/// name the integer width backing the state; the wide `Decimal128` kinds
/// are the dispatcher's default before narrowing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum AggKind {
    FirstInt,
    FirstUInt,
    FirstFloat,
    FirstLargeInt,
    FirstDecimal16,
    FirstDecimal32,
    FirstDecimal64,
    FirstDecimal128,
    LastInt,
    LastUInt,
    LastFloat,
    LastLargeInt,
    LastDecimal16,
    LastDecimal32,
    LastDecimal64,
    LastDecimal128,
}

pub(crate) mod common;
mod first_last;

use first_last::FirstLastAgg;

pub(super) trait AggregateFunction {
    fn build_spec_from_type(
        &self,
        func: &AggFunction,
        input_type: Option<&DataType>,
        input_is_intermediate: bool,
    ) -> Result<AggSpec, String>;

    fn state_layout_for(&self, kind: &AggKind) -> (usize, usize);

    fn build_input_view<'a>(
        &self,
        spec: &AggSpec,
        array: &'a Option<ArrayRef>,
    ) -> Result<AggInputView<'a>, String>;

    fn build_merge_view<'a>(
        &self,
        spec: &AggSpec,
        array: &'a Option<ArrayRef>,
    ) -> Result<AggInputView<'a>, String>;

    fn init_state(&self, spec: &AggSpec, ptr: *mut u8);
    fn drop_state(&self, spec: &AggSpec, ptr: *mut u8);

    fn update_batch(
        &self,
        spec: &AggSpec,
        offset: usize,
        state_ptrs: &[AggStatePtr],
        input: &AggInputView,
    ) -> Result<(), String>;

    fn merge_batch(
        &self,
        spec: &AggSpec,
        offset: usize,
        state_ptrs: &[AggStatePtr],
        input: &AggInputView,
    ) -> Result<(), String>;

    fn build_array(
        &self,
        spec: &AggSpec,
        offset: usize,
        group_states: &[AggStatePtr],
        output_intermediate: bool,
    ) -> Result<ArrayRef, String>;
}

static FIRST_LAST: FirstLastAgg = FirstLastAgg;

fn resolve_by_func(func: &AggFunction) -> Result<&'static dyn AggregateFunction, String> {
    match func.name.as_str() {
        "first_s" | "last_s" => Ok(&FIRST_LAST),
        other => Err(format!("unsupported agg function: {}", other)),
    }
}

fn resolve_by_kind(_kind: &AggKind) -> &'static dyn AggregateFunction {
    // Every kind in this crate belongs to the first/last family.
    &FIRST_LAST
}

pub(super) fn build_spec_from_type(
    func: &AggFunction,
    input_type: Option<&DataType>,
    input_is_intermediate: bool,
) -> Result<AggSpec, String> {
    resolve_by_func(func)?.build_spec_from_type(func, input_type, input_is_intermediate)
}

pub(in crate::exec::expr::agg) fn state_layout_for_kind(kind: &AggKind) -> (usize, usize) {
    resolve_by_kind(kind).state_layout_for(kind)
}

pub(in crate::exec::expr::agg) fn build_input_view<'a>(
    spec: &AggSpec,
    array: &'a Option<ArrayRef>,
) -> Result<AggInputView<'a>, String> {
    resolve_by_kind(&spec.kind).build_input_view(spec, array)
}

pub(in crate::exec::expr::agg) fn build_merge_view<'a>(
    spec: &AggSpec,
    array: &'a Option<ArrayRef>,
) -> Result<AggInputView<'a>, String> {
    resolve_by_kind(&spec.kind).build_merge_view(spec, array)
}

pub(in crate::exec::expr::agg) fn init_state(spec: &AggSpec, ptr: *mut u8) {
    resolve_by_kind(&spec.kind).init_state(spec, ptr)
}

pub(in crate::exec::expr::agg) fn drop_state(spec: &AggSpec, ptr: *mut u8) {
    resolve_by_kind(&spec.kind).drop_state(spec, ptr)
}

pub(in crate::exec::expr::agg) fn update_batch(
    spec: &AggSpec,
    offset: usize,
    state_ptrs: &[AggStatePtr],
    input: &AggInputView,
) -> Result<(), String> {
    resolve_by_kind(&spec.kind).update_batch(spec, offset, state_ptrs, input)
}

pub(in crate::exec::expr::agg) fn merge_batch(
    spec: &AggSpec,
    offset: usize,
    state_ptrs: &[AggStatePtr],
    input: &AggInputView,
) -> Result<(), String> {
    resolve_by_kind(&spec.kind).merge_batch(spec, offset, state_ptrs, input)
}

pub(in crate::exec::expr::agg) fn build_array(
    spec: &AggSpec,
    offset: usize,
    group_states: &[AggStatePtr],
    output_intermediate: bool,
) -> Result<ArrayRef, String> {
    resolve_by_kind(&spec.kind).build_array(spec, offset, group_states, output_intermediate)
}
