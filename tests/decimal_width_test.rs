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

//! Decimal payloads across the physical-width spectrum, driven through the
//! registry templates the way a host engine would bind them.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Decimal128Array, StructArray, TimestampMicrosecondArray};
use arrow::datatypes::DataType;

use tickagg::exec::expr::agg;
use tickagg::registry;

fn decimal_pair_struct(
    input_type: &DataType,
    values: Vec<Option<i128>>,
    keys: Vec<Option<i64>>,
    precision: u8,
    scale: i8,
) -> ArrayRef {
    let DataType::Struct(fields) = input_type else {
        panic!("template input type must be a struct");
    };
    let values = Arc::new(
        Decimal128Array::from(values)
            .with_precision_and_scale(precision, scale)
            .unwrap(),
    ) as ArrayRef;
    let keys =
        Arc::new(TimestampMicrosecondArray::from(keys).with_timezone("UTC")) as ArrayRef;
    Arc::new(StructArray::new(fields.clone(), vec![values, keys], None)) as ArrayRef
}

/// Full two-phase plan over decimal `(value, key)` partitions; returns the
/// merged group's unscaled value.
fn run_two_phase_decimal(
    name: &str,
    precision: u8,
    scale: i8,
    partitions: &[Vec<(Option<i128>, Option<i64>)>],
    merge_order: &[usize],
) -> Option<i128> {
    let template = registry::decimal_function(name, precision, scale).unwrap();
    let func = template.agg_function();
    let input_type = template.input_type();

    let kernels = agg::build_kernel_set(&[func.clone()], &[Some(input_type.clone())]).unwrap();
    let kernel = &kernels.entries[0];

    let mut arena = agg::AggStateArena::new(4096);
    let mut bases = Vec::with_capacity(partitions.len());
    for rows in partitions {
        let base = arena.alloc(kernels.layout.total_size, kernel.state_align());
        kernel.init_state(base);
        let (values, keys): (Vec<_>, Vec<_>) = rows.iter().cloned().unzip();
        let input = Some(decimal_pair_struct(&input_type, values, keys, precision, scale));
        let view = kernel.build_input_view(&input).unwrap();
        kernel.update_batch(&vec![base; rows.len()], &view).unwrap();
        bases.push(base);
    }

    let ordered: Vec<_> = merge_order.iter().map(|&idx| bases[idx]).collect();
    let intermediate = kernel.build_array(&ordered, true).unwrap();

    let mut func_merge = func;
    func_merge.input_is_intermediate = true;
    let kernels_merge =
        agg::build_kernel_set(&[func_merge], &[Some(DataType::Binary)]).unwrap();
    let kernel_merge = &kernels_merge.entries[0];

    let base_final = arena.alloc(kernels_merge.layout.total_size, kernel_merge.state_align());
    kernel_merge.init_state(base_final);

    let merge_input = Some(intermediate.clone());
    let merge_view = kernel_merge.build_merge_view(&merge_input).unwrap();
    kernel_merge
        .merge_batch(&vec![base_final; intermediate.len()], &merge_view)
        .unwrap();

    let out = kernel_merge.build_array(&[base_final], false).unwrap();
    assert_eq!(out.data_type(), &DataType::Decimal128(precision, scale));
    let out = out
        .as_any()
        .downcast_ref::<Decimal128Array>()
        .expect("decimal output");
    if out.is_null(0) { None } else { Some(out.value(0)) }
}

#[test]
fn test_decimal_two_phase_picks_earliest_value() {
    let partitions = vec![
        vec![(Some(12_345), Some(50)), (Some(-777), Some(20))],
        vec![(Some(999), Some(90)), (None, Some(5))],
    ];
    assert_eq!(
        run_two_phase_decimal("first_s", 9, 2, &partitions, &[0, 1]),
        Some(-777)
    );
    assert_eq!(
        run_two_phase_decimal("last_s", 9, 2, &partitions, &[0, 1]),
        Some(999)
    );
}

#[test]
fn test_narrow_widths_match_wide_kernel_output() {
    // The same unscaled values fit every precision tier; the narrowed
    // kernels must agree with the generic 128-bit one bit-for-bit.
    let partitions = vec![
        vec![(Some(1_234), Some(30)), (Some(-999), Some(10))],
        vec![(Some(42), Some(70))],
    ];
    let wide = run_two_phase_decimal("first_s", 38, 2, &partitions, &[0, 1]);
    assert_eq!(wide, Some(-999));
    for precision in [4, 9, 18] {
        let narrow = run_two_phase_decimal("first_s", precision, 2, &partitions, &[0, 1]);
        assert_eq!(narrow, wide, "precision {}", precision);
    }
}

#[test]
fn test_max_magnitude_values_per_width() {
    for (precision, max_unscaled) in [
        (4_u8, 9_999_i128),
        (9, 999_999_999),
        (18, 999_999_999_999_999_999),
        (38, 99_999_999_999_999_999_999_999_999_999_999_999_999),
    ] {
        let rows = vec![
            vec![(Some(max_unscaled), Some(1)), (Some(-max_unscaled), Some(2))],
        ];
        assert_eq!(
            run_two_phase_decimal("first_s", precision, 0, &rows, &[0]),
            Some(max_unscaled),
            "precision {}",
            precision
        );
        assert_eq!(
            run_two_phase_decimal("last_s", precision, 0, &rows, &[0]),
            Some(-max_unscaled),
            "precision {}",
            precision
        );
    }
}

#[test]
fn test_decimal_empty_group_is_null() {
    let partitions = vec![vec![(None, Some(1)), (Some(5), None)]];
    assert_eq!(
        run_two_phase_decimal("first_s", 9, 2, &partitions, &[0]),
        None
    );
}

#[test]
fn test_decimal_tie_across_partitions_follows_merge_order() {
    let partitions = vec![vec![(Some(1), Some(100))], vec![(Some(2), Some(100))]];
    assert_eq!(
        run_two_phase_decimal("first_s", 9, 0, &partitions, &[0, 1]),
        Some(1)
    );
    assert_eq!(
        run_two_phase_decimal("first_s", 9, 0, &partitions, &[1, 0]),
        Some(2)
    );
}
