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

use arrow::array::{ArrayRef, FixedSizeBinaryArray, FixedSizeBinaryBuilder};
use arrow::datatypes::DataType;

/// LARGEINT (128-bit signed integer) travels through Arrow as
/// `FixedSizeBinary(16)` holding the big-endian two's-complement bytes.
pub const LARGEINT_BYTE_WIDTH: i32 = 16;

pub fn is_largeint_type(dt: &DataType) -> bool {
    matches!(dt, DataType::FixedSizeBinary(w) if *w == LARGEINT_BYTE_WIDTH)
}

pub fn i128_from_be_bytes(bytes: &[u8]) -> Result<i128, String> {
    let buf: [u8; 16] = bytes.try_into().map_err(|_| {
        format!(
            "invalid LARGEINT byte length: expected {}, got {}",
            LARGEINT_BYTE_WIDTH,
            bytes.len()
        )
    })?;
    Ok(i128::from_be_bytes(buf))
}

pub fn array_from_i128(values: &[Option<i128>]) -> Result<ArrayRef, String> {
    let mut builder = FixedSizeBinaryBuilder::with_capacity(values.len(), LARGEINT_BYTE_WIDTH);
    for value in values {
        match value {
            Some(v) => builder
                .append_value(v.to_be_bytes())
                .map_err(|e| e.to_string())?,
            None => builder.append_null(),
        }
    }
    Ok(Arc::new(builder.finish()) as ArrayRef)
}

pub fn as_largeint_array<'a>(
    array: &'a ArrayRef,
    context: &str,
) -> Result<&'a FixedSizeBinaryArray, String> {
    let arr = array
        .as_any()
        .downcast_ref::<FixedSizeBinaryArray>()
        .ok_or_else(|| format!("{context}: expected FixedSizeBinaryArray"))?;
    if arr.value_length() != LARGEINT_BYTE_WIDTH {
        return Err(format!(
            "{context}: expected FixedSizeBinary({}), got FixedSizeBinary({})",
            LARGEINT_BYTE_WIDTH,
            arr.value_length()
        ));
    }
    Ok(arr)
}

pub fn value_at(arr: &FixedSizeBinaryArray, row: usize) -> Result<i128, String> {
    i128_from_be_bytes(arr.value(row))
}

#[cfg(test)]
mod tests {
    use arrow::array::Array;

    use super::*;

    #[test]
    fn test_largeint_round_trip() {
        let values = [
            Some(i128::MIN),
            Some(-1),
            None,
            Some(0),
            Some(9_223_372_036_854_775_808_i128),
            Some(i128::MAX),
        ];
        let array = array_from_i128(&values).unwrap();
        let arr = as_largeint_array(&array, "round trip").unwrap();
        for (row, expected) in values.iter().enumerate() {
            match expected {
                Some(v) => assert_eq!(value_at(arr, row).unwrap(), *v),
                None => assert!(arr.is_null(row)),
            }
        }
    }

    #[test]
    fn test_bad_byte_length_rejected() {
        assert!(i128_from_be_bytes(&[0u8; 8]).is_err());
    }
}
