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

use super::functions::AggKind;

/// Physical integer backing of a fixed-point decimal, as classified by the
/// storage engine from the declared precision.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecimalPhysicalWidth {
    Int16,
    Int32,
    Int64,
    Int128,
}

pub const MAX_INT16_DECIMAL_PRECISION: u8 = 4;
pub const MAX_INT32_DECIMAL_PRECISION: u8 = 9;
pub const MAX_INT64_DECIMAL_PRECISION: u8 = 18;

/// Narrowest signed integer that can hold every unscaled value of a decimal
/// with `precision` digits.
pub fn decimal_physical_width(precision: u8) -> DecimalPhysicalWidth {
    if precision <= MAX_INT16_DECIMAL_PRECISION {
        DecimalPhysicalWidth::Int16
    } else if precision <= MAX_INT32_DECIMAL_PRECISION {
        DecimalPhysicalWidth::Int32
    } else if precision <= MAX_INT64_DECIMAL_PRECISION {
        DecimalPhysicalWidth::Int64
    } else {
        DecimalPhysicalWidth::Int128
    }
}

pub(super) fn decimal_width_for_type(data_type: &DataType) -> Option<DecimalPhysicalWidth> {
    match data_type {
        DataType::Decimal128(precision, _) => Some(decimal_physical_width(*precision)),
        _ => None,
    }
}

/// Bind-time specialization: swap the wide (`i128`-backed) keyed-extremal
/// kind for the narrow backing selected by `width`. Anything that is not a
/// wide decimal kind, and the `Int128` classification itself, passes
/// through unchanged, so a missed narrowing can only cost performance.
pub(super) fn narrow_decimal_kind(kind: AggKind, width: DecimalPhysicalWidth) -> AggKind {
    match (kind, width) {
        (AggKind::FirstDecimal128, DecimalPhysicalWidth::Int16) => AggKind::FirstDecimal16,
        (AggKind::FirstDecimal128, DecimalPhysicalWidth::Int32) => AggKind::FirstDecimal32,
        (AggKind::FirstDecimal128, DecimalPhysicalWidth::Int64) => AggKind::FirstDecimal64,
        (AggKind::LastDecimal128, DecimalPhysicalWidth::Int16) => AggKind::LastDecimal16,
        (AggKind::LastDecimal128, DecimalPhysicalWidth::Int32) => AggKind::LastDecimal32,
        (AggKind::LastDecimal128, DecimalPhysicalWidth::Int64) => AggKind::LastDecimal64,
        (other, _) => other,
    }
}
