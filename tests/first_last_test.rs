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

use arrow::array::{Array, ArrayRef, Int64Array, StructArray};
use arrow::datatypes::{DataType, Field, Fields};

use tickagg::exec::expr::agg;
use tickagg::exec::node::aggregate::{AggFunction, AggTypeSignature};

fn pair_struct(values: Vec<Option<i64>>, keys: Vec<Option<i64>>) -> ArrayRef {
    let fields = vec![
        Field::new("value", DataType::Int64, true),
        Field::new("key", DataType::Int64, true),
    ];
    let values = Arc::new(Int64Array::from(values)) as ArrayRef;
    let keys = Arc::new(Int64Array::from(keys)) as ArrayRef;
    Arc::new(StructArray::new(
        Fields::from(fields),
        vec![values, keys],
        None,
    )) as ArrayRef
}

fn i64_agg_function(name: &str) -> AggFunction {
    AggFunction {
        name: name.to_string(),
        inputs: vec![],
        input_is_intermediate: false,
        types: Some(AggTypeSignature {
            intermediate_type: Some(DataType::Binary),
            output_type: Some(DataType::Int64),
            input_arg_type: None,
        }),
    }
}

/// Run the full two-phase plan: per-partition update, intermediate export
/// in `merge_order`, then a single merge-stage reduction.
fn run_two_phase_i64(
    name: &str,
    partitions: &[Vec<(Option<i64>, Option<i64>)>],
    merge_order: &[usize],
) -> Option<i64> {
    let func = i64_agg_function(name);
    let input_type = DataType::Struct(Fields::from(vec![
        Field::new("value", DataType::Int64, true),
        Field::new("key", DataType::Int64, true),
    ]));
    let kernels = agg::build_kernel_set(&[func.clone()], &[Some(input_type)]).unwrap();
    let kernel = &kernels.entries[0];

    let mut arena = agg::AggStateArena::new(4096);
    let mut bases = Vec::with_capacity(partitions.len());
    for rows in partitions {
        let base = arena.alloc(kernels.layout.total_size, kernel.state_align());
        kernel.init_state(base);
        let (values, keys): (Vec<_>, Vec<_>) = rows.iter().cloned().unzip();
        let input = Some(pair_struct(values, keys));
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
    let out = out.as_any().downcast_ref::<Int64Array>().expect("i64 out");
    if out.is_null(0) { None } else { Some(out.value(0)) }
}

fn run_sequential_i64(name: &str, rows: &[(Option<i64>, Option<i64>)]) -> Option<i64> {
    run_two_phase_i64(name, &[rows.to_vec()], &[0])
}

#[test]
fn test_empty_input_finalizes_to_null() {
    assert_eq!(run_sequential_i64("first_s", &[]), None);
    assert_eq!(run_sequential_i64("last_s", &[]), None);
}

#[test]
fn test_single_valid_row_among_invalid_rows() {
    let rows = vec![
        (None, Some(5)),
        (Some(7), Some(3)),
        (Some(9), None),
        (None, None),
    ];
    assert_eq!(run_sequential_i64("first_s", &rows), Some(7));
    assert_eq!(run_sequential_i64("last_s", &rows), Some(7));
}

#[test]
fn test_null_skip_on_either_operand() {
    let rows = vec![(None, Some(5)), (Some(7), Some(3)), (Some(9), None)];
    assert_eq!(run_sequential_i64("first_s", &rows), Some(7));
}

#[test]
fn test_first_and_last_pick_opposite_ends() {
    let rows = vec![
        (Some(10), Some(30)),
        (Some(20), Some(10)),
        (Some(30), Some(20)),
    ];
    assert_eq!(run_sequential_i64("first_s", &rows), Some(20));
    assert_eq!(run_sequential_i64("last_s", &rows), Some(10));
}

#[test]
fn test_order_independence_with_unique_minimum() {
    let rows: Vec<(Option<i64>, Option<i64>)> = (0..12)
        .map(|i| (Some(100 + i), Some((i * 37 + 11) % 53)))
        .collect();
    let expected = run_sequential_i64("first_s", &rows);
    assert!(expected.is_some());

    let splits: Vec<Vec<Vec<(Option<i64>, Option<i64>)>>> = vec![
        vec![rows.clone()],
        vec![rows[..5].to_vec(), rows[5..].to_vec()],
        vec![rows[..3].to_vec(), rows[3..7].to_vec(), rows[7..].to_vec()],
        rows.iter().map(|r| vec![*r]).collect(),
    ];
    for partitions in &splits {
        let forward: Vec<usize> = (0..partitions.len()).collect();
        let reverse: Vec<usize> = (0..partitions.len()).rev().collect();
        assert_eq!(run_two_phase_i64("first_s", partitions, &forward), expected);
        assert_eq!(run_two_phase_i64("first_s", partitions, &reverse), expected);
    }
}

#[test]
fn test_combine_tie_break_depends_on_merge_order() {
    // Two single-row partitions carrying the same key. Combine keeps the
    // state that reached the merged target first, so the merge order
    // decides the winner.
    let partitions = vec![vec![(Some(1), Some(100))], vec![(Some(2), Some(100))]];
    assert_eq!(run_two_phase_i64("first_s", &partitions, &[0, 1]), Some(1));
    assert_eq!(run_two_phase_i64("first_s", &partitions, &[1, 0]), Some(2));
    assert_eq!(run_two_phase_i64("last_s", &partitions, &[0, 1]), Some(1));
    assert_eq!(run_two_phase_i64("last_s", &partitions, &[1, 0]), Some(2));
}

#[test]
fn test_accumulate_tie_break_is_arrival_order() {
    let rows = vec![(Some(1), Some(100)), (Some(2), Some(100))];
    assert_eq!(run_sequential_i64("first_s", &rows), Some(1));
    assert_eq!(run_sequential_i64("last_s", &rows), Some(1));
}

#[test]
fn test_merge_with_empty_partitions() {
    let partitions = vec![
        vec![(None, None)],
        vec![(Some(7), Some(3))],
        vec![],
    ];
    assert_eq!(run_two_phase_i64("first_s", &partitions, &[0, 1, 2]), Some(7));
    assert_eq!(run_two_phase_i64("first_s", &partitions, &[2, 1, 0]), Some(7));
    assert_eq!(run_two_phase_i64("first_s", &partitions, &[0, 2]), None);
}

#[test]
fn test_extreme_keys_do_not_collide_with_sentinels() {
    // A real row carrying the sentinel key value must still be observed.
    let rows = vec![(Some(1), Some(i64::MAX)), (Some(2), Some(i64::MIN))];
    assert_eq!(run_sequential_i64("first_s", &rows), Some(2));
    assert_eq!(run_sequential_i64("last_s", &rows), Some(1));

    let only_max = vec![(Some(1), Some(i64::MAX))];
    assert_eq!(run_sequential_i64("first_s", &only_max), Some(1));
    let only_min = vec![(Some(1), Some(i64::MIN))];
    assert_eq!(run_sequential_i64("last_s", &only_min), Some(1));
}

#[test]
fn test_non_numeric_payload_is_a_bind_time_error() {
    let func = AggFunction {
        name: "first_s".to_string(),
        inputs: vec![],
        input_is_intermediate: false,
        types: Some(AggTypeSignature {
            intermediate_type: Some(DataType::Binary),
            output_type: Some(DataType::Utf8),
            input_arg_type: None,
        }),
    };
    let input_type = DataType::Struct(Fields::from(vec![
        Field::new("value", DataType::Utf8, true),
        Field::new("key", DataType::Int64, true),
    ]));
    let err = agg::build_kernel_set(&[func], &[Some(input_type)]).unwrap_err();
    assert!(err.contains("only accepts numeric inputs"), "{err}");
}
