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

use arrow::array::{
    ArrayRef, Decimal128Array, Float32Builder, Float64Builder, Int8Builder, Int16Builder,
    Int32Builder, Int64Builder, UInt8Builder, UInt16Builder, UInt32Builder, UInt64Builder,
};
use arrow::datatypes::DataType;

use crate::common::largeint;

/// Finalized payload lifted out of a kernel state, widened to the state's
/// storage width. [`build_scalar_array`] casts back down to the declared
/// output type.
#[derive(Clone, Copy, Debug)]
pub(crate) enum AggScalarValue {
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    LargeInt(i128),
    Decimal128(i128),
}

pub(crate) fn build_scalar_array(
    output_type: &DataType,
    values: Vec<Option<AggScalarValue>>,
) -> Result<ArrayRef, String> {
    match output_type {
        DataType::Int8 => {
            let mut builder = Int8Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::Int64(v)) => {
                        let v = i8::try_from(v).map_err(|_| "int8 overflow".to_string())?;
                        builder.append_value(v);
                    }
                    None => builder.append_null(),
                    _ => return Err("scalar output type mismatch for Int8".to_string()),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::Int16 => {
            let mut builder = Int16Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::Int64(v)) => {
                        let v = i16::try_from(v).map_err(|_| "int16 overflow".to_string())?;
                        builder.append_value(v);
                    }
                    None => builder.append_null(),
                    _ => return Err("scalar output type mismatch for Int16".to_string()),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::Int32 => {
            let mut builder = Int32Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::Int64(v)) => {
                        let v = i32::try_from(v).map_err(|_| "int32 overflow".to_string())?;
                        builder.append_value(v);
                    }
                    None => builder.append_null(),
                    _ => return Err("scalar output type mismatch for Int32".to_string()),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::Int64 => {
            let mut builder = Int64Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::Int64(v)) => builder.append_value(v),
                    None => builder.append_null(),
                    _ => return Err("scalar output type mismatch for Int64".to_string()),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::UInt8 => {
            let mut builder = UInt8Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::UInt64(v)) => {
                        let v = u8::try_from(v).map_err(|_| "uint8 overflow".to_string())?;
                        builder.append_value(v);
                    }
                    None => builder.append_null(),
                    _ => return Err("scalar output type mismatch for UInt8".to_string()),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::UInt16 => {
            let mut builder = UInt16Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::UInt64(v)) => {
                        let v = u16::try_from(v).map_err(|_| "uint16 overflow".to_string())?;
                        builder.append_value(v);
                    }
                    None => builder.append_null(),
                    _ => return Err("scalar output type mismatch for UInt16".to_string()),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::UInt32 => {
            let mut builder = UInt32Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::UInt64(v)) => {
                        let v = u32::try_from(v).map_err(|_| "uint32 overflow".to_string())?;
                        builder.append_value(v);
                    }
                    None => builder.append_null(),
                    _ => return Err("scalar output type mismatch for UInt32".to_string()),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::UInt64 => {
            let mut builder = UInt64Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::UInt64(v)) => builder.append_value(v),
                    None => builder.append_null(),
                    _ => return Err("scalar output type mismatch for UInt64".to_string()),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::Float32 => {
            let mut builder = Float32Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::Float64(v)) => builder.append_value(v as f32),
                    None => builder.append_null(),
                    _ => return Err("scalar output type mismatch for Float32".to_string()),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::Float64 => {
            let mut builder = Float64Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::Float64(v)) => builder.append_value(v),
                    None => builder.append_null(),
                    _ => return Err("scalar output type mismatch for Float64".to_string()),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::FixedSizeBinary(width) if *width == largeint::LARGEINT_BYTE_WIDTH => {
            let mut out = Vec::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::LargeInt(v)) => out.push(Some(v)),
                    None => out.push(None),
                    _ => return Err("scalar output type mismatch for LargeInt".to_string()),
                }
            }
            largeint::array_from_i128(&out)
        }
        DataType::Decimal128(precision, scale) => {
            let mut out = Vec::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::Decimal128(v)) => out.push(Some(v)),
                    None => out.push(None),
                    _ => return Err("scalar output type mismatch for Decimal128".to_string()),
                }
            }
            let array = Decimal128Array::from(out)
                .with_precision_and_scale(*precision, *scale)
                .map_err(|e| e.to_string())?;
            Ok(Arc::new(array))
        }
        other => Err(format!("unsupported scalar output type: {:?}", other)),
    }
}
