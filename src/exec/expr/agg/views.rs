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
use arrow::array::{
    Array, ArrayRef, BinaryArray, Decimal128Array, FixedSizeBinaryArray, Float32Array,
    Float64Array, Int8Array, Int16Array, Int32Array, Int64Array, StructArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray, UInt8Array, UInt16Array, UInt32Array, UInt64Array,
};
use arrow::datatypes::{DataType, TimeUnit};

use crate::common::largeint;

/// Borrowed, typed access to one aggregate input column (or column pair)
/// for the duration of a batch.
pub enum AggInputView<'a> {
    /// Raw `(value, key)` rows for the update stage.
    Pair(PairView<'a>),
    /// Serialized partial states for the merge stage.
    Binary(&'a BinaryArray),
}

/// Aligned `(value, key)` slices unpacked from the two-field struct input
/// of a keyed aggregate.
pub struct PairView<'a> {
    pub(crate) values: PayloadArrayView<'a>,
    pub(crate) keys: KeyArrayView<'a>,
}

impl<'a> PairView<'a> {
    pub fn from_struct(array: &'a ArrayRef) -> Result<Self, String> {
        let struct_arr = array
            .as_any()
            .downcast_ref::<StructArray>()
            .ok_or_else(|| "keyed aggregate expects struct input".to_string())?;
        if struct_arr.num_columns() != 2 {
            return Err("keyed aggregate expects 2 arguments".to_string());
        }
        Ok(Self {
            values: PayloadArrayView::new(struct_arr.column(0))?,
            keys: KeyArrayView::new(struct_arr.column(1))?,
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Typed view over the payload column of a keyed aggregate.
pub enum PayloadArrayView<'a> {
    Int(IntArrayView<'a>),
    UInt(UIntArrayView<'a>),
    Float(FloatArrayView<'a>),
    LargeInt(&'a FixedSizeBinaryArray),
    Decimal128(&'a Decimal128Array),
}

impl<'a> PayloadArrayView<'a> {
    pub fn new(array: &'a ArrayRef) -> Result<Self, String> {
        match array.data_type() {
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
                Ok(Self::Int(IntArrayView::new(array)?))
            }
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
                Ok(Self::UInt(UIntArrayView::new(array)?))
            }
            DataType::Float32 | DataType::Float64 => Ok(Self::Float(FloatArrayView::new(array)?)),
            DataType::FixedSizeBinary(w) if *w == largeint::LARGEINT_BYTE_WIDTH => Ok(
                Self::LargeInt(largeint::as_largeint_array(array, "largeint payload")?),
            ),
            DataType::Decimal128(_, _) => array
                .as_any()
                .downcast_ref::<Decimal128Array>()
                .map(Self::Decimal128)
                .ok_or_else(|| "failed to downcast to Decimal128Array".to_string()),
            other => Err(format!("unsupported payload type: {:?}", other)),
        }
    }
}

/// Signed integer payloads, widened to `i64` on access.
#[derive(Clone, Debug)]
pub enum IntArrayView<'a> {
    Int64(&'a Int64Array),
    Int32(&'a Int32Array),
    Int16(&'a Int16Array),
    Int8(&'a Int8Array),
}

impl<'a> IntArrayView<'a> {
    pub fn new(array: &'a ArrayRef) -> Result<Self, String> {
        match array.data_type() {
            DataType::Int64 => array
                .as_any()
                .downcast_ref::<Int64Array>()
                .map(Self::Int64)
                .ok_or_else(|| "failed to downcast to Int64Array".to_string()),
            DataType::Int32 => array
                .as_any()
                .downcast_ref::<Int32Array>()
                .map(Self::Int32)
                .ok_or_else(|| "failed to downcast to Int32Array".to_string()),
            DataType::Int16 => array
                .as_any()
                .downcast_ref::<Int16Array>()
                .map(Self::Int16)
                .ok_or_else(|| "failed to downcast to Int16Array".to_string()),
            DataType::Int8 => array
                .as_any()
                .downcast_ref::<Int8Array>()
                .map(Self::Int8)
                .ok_or_else(|| "failed to downcast to Int8Array".to_string()),
            other => Err(format!("unsupported int input type: {:?}", other)),
        }
    }

    pub fn value_at(&self, row: usize) -> Option<i64> {
        match self {
            IntArrayView::Int64(arr) => (!arr.is_null(row)).then(|| arr.value(row)),
            IntArrayView::Int32(arr) => (!arr.is_null(row)).then(|| arr.value(row) as i64),
            IntArrayView::Int16(arr) => (!arr.is_null(row)).then(|| arr.value(row) as i64),
            IntArrayView::Int8(arr) => (!arr.is_null(row)).then(|| arr.value(row) as i64),
        }
    }
}

/// Unsigned integer payloads, widened to `u64` on access.
#[derive(Clone, Debug)]
pub enum UIntArrayView<'a> {
    UInt64(&'a UInt64Array),
    UInt32(&'a UInt32Array),
    UInt16(&'a UInt16Array),
    UInt8(&'a UInt8Array),
}

impl<'a> UIntArrayView<'a> {
    pub fn new(array: &'a ArrayRef) -> Result<Self, String> {
        match array.data_type() {
            DataType::UInt64 => array
                .as_any()
                .downcast_ref::<UInt64Array>()
                .map(Self::UInt64)
                .ok_or_else(|| "failed to downcast to UInt64Array".to_string()),
            DataType::UInt32 => array
                .as_any()
                .downcast_ref::<UInt32Array>()
                .map(Self::UInt32)
                .ok_or_else(|| "failed to downcast to UInt32Array".to_string()),
            DataType::UInt16 => array
                .as_any()
                .downcast_ref::<UInt16Array>()
                .map(Self::UInt16)
                .ok_or_else(|| "failed to downcast to UInt16Array".to_string()),
            DataType::UInt8 => array
                .as_any()
                .downcast_ref::<UInt8Array>()
                .map(Self::UInt8)
                .ok_or_else(|| "failed to downcast to UInt8Array".to_string()),
            other => Err(format!("unsupported uint input type: {:?}", other)),
        }
    }

    pub fn value_at(&self, row: usize) -> Option<u64> {
        match self {
            UIntArrayView::UInt64(arr) => (!arr.is_null(row)).then(|| arr.value(row)),
            UIntArrayView::UInt32(arr) => (!arr.is_null(row)).then(|| arr.value(row) as u64),
            UIntArrayView::UInt16(arr) => (!arr.is_null(row)).then(|| arr.value(row) as u64),
            UIntArrayView::UInt8(arr) => (!arr.is_null(row)).then(|| arr.value(row) as u64),
        }
    }
}

/// Float payloads, widened to `f64` on access.
#[derive(Clone, Debug)]
pub enum FloatArrayView<'a> {
    Float64(&'a Float64Array),
    Float32(&'a Float32Array),
}

impl<'a> FloatArrayView<'a> {
    pub fn new(array: &'a ArrayRef) -> Result<Self, String> {
        match array.data_type() {
            DataType::Float64 => array
                .as_any()
                .downcast_ref::<Float64Array>()
                .map(Self::Float64)
                .ok_or_else(|| "failed to downcast to Float64Array".to_string()),
            DataType::Float32 => array
                .as_any()
                .downcast_ref::<Float32Array>()
                .map(Self::Float32)
                .ok_or_else(|| "failed to downcast to Float32Array".to_string()),
            other => Err(format!("unsupported float input type: {:?}", other)),
        }
    }

    pub fn value_at(&self, row: usize) -> Option<f64> {
        match self {
            FloatArrayView::Float64(arr) => (!arr.is_null(row)).then(|| arr.value(row)),
            FloatArrayView::Float32(arr) => (!arr.is_null(row)).then(|| arr.value(row) as f64),
        }
    }
}

/// Ordering-key column: a 64-bit signed integer or any timestamp unit,
/// reduced to the raw `i64` on access.
#[derive(Clone, Debug)]
pub enum KeyArrayView<'a> {
    Int64(&'a Int64Array),
    TimestampSecond(&'a TimestampSecondArray),
    TimestampMillisecond(&'a TimestampMillisecondArray),
    TimestampMicrosecond(&'a TimestampMicrosecondArray),
    TimestampNanosecond(&'a TimestampNanosecondArray),
}

/// Whether `dt` is usable as a keyed-aggregate ordering key.
pub fn is_ordering_key_type(dt: &DataType) -> bool {
    matches!(dt, DataType::Int64 | DataType::Timestamp(_, _))
}

impl<'a> KeyArrayView<'a> {
    pub fn new(array: &'a ArrayRef) -> Result<Self, String> {
        match array.data_type() {
            DataType::Int64 => array
                .as_any()
                .downcast_ref::<Int64Array>()
                .map(Self::Int64)
                .ok_or_else(|| "failed to downcast to Int64Array".to_string()),
            DataType::Timestamp(unit, _) => match unit {
                TimeUnit::Second => array
                    .as_any()
                    .downcast_ref::<TimestampSecondArray>()
                    .map(Self::TimestampSecond)
                    .ok_or_else(|| "failed to downcast to TimestampSecondArray".to_string()),
                TimeUnit::Millisecond => array
                    .as_any()
                    .downcast_ref::<TimestampMillisecondArray>()
                    .map(Self::TimestampMillisecond)
                    .ok_or_else(|| "failed to downcast to TimestampMillisecondArray".to_string()),
                TimeUnit::Microsecond => array
                    .as_any()
                    .downcast_ref::<TimestampMicrosecondArray>()
                    .map(Self::TimestampMicrosecond)
                    .ok_or_else(|| "failed to downcast to TimestampMicrosecondArray".to_string()),
                TimeUnit::Nanosecond => array
                    .as_any()
                    .downcast_ref::<TimestampNanosecondArray>()
                    .map(Self::TimestampNanosecond)
                    .ok_or_else(|| "failed to downcast to TimestampNanosecondArray".to_string()),
            },
            other => Err(format!("unsupported ordering key type: {:?}", other)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            KeyArrayView::Int64(arr) => arr.len(),
            KeyArrayView::TimestampSecond(arr) => arr.len(),
            KeyArrayView::TimestampMillisecond(arr) => arr.len(),
            KeyArrayView::TimestampMicrosecond(arr) => arr.len(),
            KeyArrayView::TimestampNanosecond(arr) => arr.len(),
        }
    }

    pub fn value_at(&self, row: usize) -> Option<i64> {
        match self {
            KeyArrayView::Int64(arr) => (!arr.is_null(row)).then(|| arr.value(row)),
            KeyArrayView::TimestampSecond(arr) => (!arr.is_null(row)).then(|| arr.value(row)),
            KeyArrayView::TimestampMillisecond(arr) => (!arr.is_null(row)).then(|| arr.value(row)),
            KeyArrayView::TimestampMicrosecond(arr) => (!arr.is_null(row)).then(|| arr.value(row)),
            KeyArrayView::TimestampNanosecond(arr) => (!arr.is_null(row)).then(|| arr.value(row)),
        }
    }
}
