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
use arrow::datatypes::DataType;

use crate::exec::expr::ExprId;

#[derive(Clone, Debug)]
pub struct AggTypeSignature {
    pub intermediate_type: Option<DataType>,
    pub output_type: Option<DataType>,
    /// Planner-declared type of the first input argument. For keyed
    /// aggregates this is the `(value, key)` struct type.
    pub input_arg_type: Option<DataType>,
}

/// Descriptor for one aggregate-function invocation, handed in by the host
/// engine's planner at bind time.
#[derive(Clone, Debug)]
pub struct AggFunction {
    /// Lowercased function name (e.g. "first_s").
    pub name: String,
    /// Input expressions for aggregate arguments, resolved by the host.
    pub inputs: Vec<ExprId>,
    /// Whether this aggregate consumes intermediate states emitted by a
    /// previous aggregation stage instead of raw rows.
    pub input_is_intermediate: bool,
    pub types: Option<AggTypeSignature>,
}
