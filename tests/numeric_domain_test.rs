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

//! Round-trip coverage for every supported payload type: extreme in-range
//! values must come back from the kernel without precision loss.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float32Array, Float64Array, Int8Array, Int16Array, Int32Array, Int64Array,
    StructArray, UInt8Array, UInt16Array, UInt32Array, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Fields};

use tickagg::common::largeint;
use tickagg::exec::expr::agg;
use tickagg::exec::node::aggregate::{AggFunction, AggTypeSignature};

/// Run one partition of `(value, key)` rows through update + finalize and
/// return the single-group output array.
fn run_single_partition(
    name: &str,
    payload_type: &DataType,
    values: ArrayRef,
    keys: Vec<Option<i64>>,
) -> ArrayRef {
    let rows = values.len();
    let fields = vec![
        Field::new("value", payload_type.clone(), true),
        Field::new("key", DataType::Int64, true),
    ];
    let input_type = DataType::Struct(Fields::from(fields.clone()));
    let keys = Arc::new(Int64Array::from(keys)) as ArrayRef;
    let input = Arc::new(StructArray::new(Fields::from(fields), vec![values, keys], None)) as ArrayRef;

    let func = AggFunction {
        name: name.to_string(),
        inputs: vec![],
        input_is_intermediate: false,
        types: Some(AggTypeSignature {
            intermediate_type: Some(DataType::Binary),
            output_type: Some(payload_type.clone()),
            input_arg_type: None,
        }),
    };
    let kernels = agg::build_kernel_set(&[func], &[Some(input_type)]).unwrap();
    let kernel = &kernels.entries[0];

    let mut arena = agg::AggStateArena::from_config();
    let base = arena.alloc(kernels.layout.total_size, kernel.state_align());
    kernel.init_state(base);

    let input = Some(input);
    let view = kernel.build_input_view(&input).unwrap();
    kernel.update_batch(&vec![base; rows], &view).unwrap();

    let out = kernel.build_array(&[base], false).unwrap();
    kernel.drop_state(base);
    out
}

/// First (smallest key) must return the head value, last (largest key) the
/// tail value; both ends are extreme in-range values for the type.
fn check_both_ends(payload_type: &DataType, values: ArrayRef) -> (ArrayRef, ArrayRef) {
    let keys: Vec<Option<i64>> = (0..values.len() as i64).map(Some).collect();
    let first = run_single_partition("first_s", payload_type, values.clone(), keys.clone());
    let last = run_single_partition("last_s", payload_type, values, keys);
    (first, last)
}

#[test]
fn test_int8_round_trip() {
    let values = Arc::new(Int8Array::from(vec![Some(i8::MIN), Some(0), Some(i8::MAX)])) as ArrayRef;
    let (first, last) = check_both_ends(&DataType::Int8, values);
    assert_eq!(first.as_any().downcast_ref::<Int8Array>().unwrap().value(0), i8::MIN);
    assert_eq!(last.as_any().downcast_ref::<Int8Array>().unwrap().value(0), i8::MAX);
}

#[test]
fn test_int16_round_trip() {
    let values =
        Arc::new(Int16Array::from(vec![Some(i16::MIN), Some(-7), Some(i16::MAX)])) as ArrayRef;
    let (first, last) = check_both_ends(&DataType::Int16, values);
    assert_eq!(first.as_any().downcast_ref::<Int16Array>().unwrap().value(0), i16::MIN);
    assert_eq!(last.as_any().downcast_ref::<Int16Array>().unwrap().value(0), i16::MAX);
}

#[test]
fn test_int32_round_trip() {
    let values =
        Arc::new(Int32Array::from(vec![Some(i32::MIN), Some(42), Some(i32::MAX)])) as ArrayRef;
    let (first, last) = check_both_ends(&DataType::Int32, values);
    assert_eq!(first.as_any().downcast_ref::<Int32Array>().unwrap().value(0), i32::MIN);
    assert_eq!(last.as_any().downcast_ref::<Int32Array>().unwrap().value(0), i32::MAX);
}

#[test]
fn test_int64_round_trip() {
    let values =
        Arc::new(Int64Array::from(vec![Some(i64::MIN), Some(0), Some(i64::MAX)])) as ArrayRef;
    let (first, last) = check_both_ends(&DataType::Int64, values);
    assert_eq!(first.as_any().downcast_ref::<Int64Array>().unwrap().value(0), i64::MIN);
    assert_eq!(last.as_any().downcast_ref::<Int64Array>().unwrap().value(0), i64::MAX);
}

#[test]
fn test_uint8_round_trip() {
    let values = Arc::new(UInt8Array::from(vec![Some(0u8), Some(1), Some(u8::MAX)])) as ArrayRef;
    let (first, last) = check_both_ends(&DataType::UInt8, values);
    assert_eq!(first.as_any().downcast_ref::<UInt8Array>().unwrap().value(0), 0);
    assert_eq!(last.as_any().downcast_ref::<UInt8Array>().unwrap().value(0), u8::MAX);
}

#[test]
fn test_uint16_round_trip() {
    let values =
        Arc::new(UInt16Array::from(vec![Some(0u16), Some(300), Some(u16::MAX)])) as ArrayRef;
    let (first, last) = check_both_ends(&DataType::UInt16, values);
    assert_eq!(first.as_any().downcast_ref::<UInt16Array>().unwrap().value(0), 0);
    assert_eq!(last.as_any().downcast_ref::<UInt16Array>().unwrap().value(0), u16::MAX);
}

#[test]
fn test_uint32_round_trip() {
    let values =
        Arc::new(UInt32Array::from(vec![Some(0u32), Some(7), Some(u32::MAX)])) as ArrayRef;
    let (first, last) = check_both_ends(&DataType::UInt32, values);
    assert_eq!(first.as_any().downcast_ref::<UInt32Array>().unwrap().value(0), 0);
    assert_eq!(last.as_any().downcast_ref::<UInt32Array>().unwrap().value(0), u32::MAX);
}

#[test]
fn test_uint64_round_trip() {
    // u64::MAX does not fit in i64; the state must hold it untouched.
    let values =
        Arc::new(UInt64Array::from(vec![Some(0u64), Some(1), Some(u64::MAX)])) as ArrayRef;
    let (first, last) = check_both_ends(&DataType::UInt64, values);
    assert_eq!(first.as_any().downcast_ref::<UInt64Array>().unwrap().value(0), 0);
    assert_eq!(last.as_any().downcast_ref::<UInt64Array>().unwrap().value(0), u64::MAX);
}

#[test]
fn test_largeint_round_trip() {
    let small = i128::MIN;
    let big = 9_223_372_036_854_775_808_i128; // i64::MAX + 1
    let values = largeint::array_from_i128(&[Some(small), Some(0), Some(big)]).unwrap();
    let payload_type = DataType::FixedSizeBinary(largeint::LARGEINT_BYTE_WIDTH);
    let (first, last) = check_both_ends(&payload_type, values);

    let first = largeint::as_largeint_array(&first, "first output").unwrap();
    assert_eq!(largeint::value_at(first, 0).unwrap(), small);
    let last = largeint::as_largeint_array(&last, "last output").unwrap();
    assert_eq!(largeint::value_at(last, 0).unwrap(), big);
}

#[test]
fn test_float32_round_trip() {
    let values =
        Arc::new(Float32Array::from(vec![Some(0.1f32), Some(-1.5), Some(f32::MAX)])) as ArrayRef;
    let (first, last) = check_both_ends(&DataType::Float32, values);
    assert_eq!(first.as_any().downcast_ref::<Float32Array>().unwrap().value(0), 0.1f32);
    assert_eq!(last.as_any().downcast_ref::<Float32Array>().unwrap().value(0), f32::MAX);
}

#[test]
fn test_float64_round_trip() {
    let values = Arc::new(Float64Array::from(vec![
        Some(f64::MIN_POSITIVE),
        Some(2.5),
        Some(f64::MAX),
    ])) as ArrayRef;
    let (first, last) = check_both_ends(&DataType::Float64, values);
    assert_eq!(
        first.as_any().downcast_ref::<Float64Array>().unwrap().value(0),
        f64::MIN_POSITIVE
    );
    assert_eq!(last.as_any().downcast_ref::<Float64Array>().unwrap().value(0), f64::MAX);
}
