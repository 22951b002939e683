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

//! Catalog templates for the keyed first/last aggregate family.
//!
//! Hosts call [`function_catalog`] (and [`decimal_function`] for concrete
//! decimal types) during their own initialization and feed the resulting
//! descriptors through their catalog-creation path; this module never
//! mutates global state.

use arrow::datatypes::{DataType, Field, Fields, TimeUnit};

use crate::common::largeint;
use crate::exec::node::aggregate::{AggFunction, AggTypeSignature};

pub const FIRST_AGG_NAME: &str = "first_s";
pub const LAST_AGG_NAME: &str = "last_s";

/// Ordering-key type declared by the catalog entries: the engine's
/// event-time column type. The kernels also bind against plain `BIGINT`
/// and the other timestamp units.
pub fn default_key_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
}

/// One registrable aggregate: family name plus the concrete payload type.
#[derive(Clone, Debug)]
pub struct AggFunctionTemplate {
    pub name: &'static str,
    pub payload_type: DataType,
    pub key_type: DataType,
}

impl AggFunctionTemplate {
    fn new(name: &'static str, payload_type: DataType) -> Self {
        Self {
            name,
            payload_type,
            key_type: default_key_type(),
        }
    }

    /// The `(value, key)` struct the host evaluates the two argument
    /// expressions into.
    pub fn input_type(&self) -> DataType {
        DataType::Struct(Fields::from(vec![
            Field::new("value", self.payload_type.clone(), true),
            Field::new("key", self.key_type.clone(), true),
        ]))
    }

    pub fn signature(&self) -> AggTypeSignature {
        AggTypeSignature {
            intermediate_type: Some(DataType::Binary),
            output_type: Some(self.payload_type.clone()),
            input_arg_type: Some(self.input_type()),
        }
    }

    /// Bind-time descriptor for this entry; the host fills in the resolved
    /// argument expressions.
    pub fn agg_function(&self) -> AggFunction {
        AggFunction {
            name: self.name.to_string(),
            inputs: vec![],
            input_is_intermediate: false,
            types: Some(self.signature()),
        }
    }
}

/// The non-parameterized payload types both families register for.
/// Decimal types carry per-query precision/scale and go through
/// [`decimal_function`] instead.
pub fn scalar_payload_types() -> Vec<DataType> {
    vec![
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::UInt8,
        DataType::UInt16,
        DataType::UInt32,
        DataType::UInt64,
        DataType::FixedSizeBinary(largeint::LARGEINT_BYTE_WIDTH),
        DataType::Float32,
        DataType::Float64,
    ]
}

/// One entry per (family, payload type) across the supported numeric
/// domain, ready to hand to the host's function catalog.
pub fn function_catalog() -> Vec<AggFunctionTemplate> {
    let mut entries = Vec::new();
    for name in [FIRST_AGG_NAME, LAST_AGG_NAME] {
        for payload_type in scalar_payload_types() {
            entries.push(AggFunctionTemplate::new(name, payload_type));
        }
    }
    entries
}

/// Template for a concrete decimal payload type. The kernel narrows its
/// state to the physical width implied by `precision` at bind time.
pub fn decimal_function(
    name: &str,
    precision: u8,
    scale: i8,
) -> Result<AggFunctionTemplate, String> {
    let name = match name {
        FIRST_AGG_NAME => FIRST_AGG_NAME,
        LAST_AGG_NAME => LAST_AGG_NAME,
        other => return Err(format!("unsupported first/last aggregate: {}", other)),
    };
    if precision == 0 || precision > 38 {
        return Err(format!(
            "decimal precision out of range for {}: {}",
            name, precision
        ));
    }
    if scale < 0 || scale as u8 > precision {
        return Err(format!("decimal scale out of range for {}: {}", name, scale));
    }
    Ok(AggFunctionTemplate::new(
        name,
        DataType::Decimal128(precision, scale),
    ))
}
