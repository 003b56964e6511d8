use arrow::array::{
    Array, ArrowPrimitiveType, BooleanArray, GenericStringArray, OffsetSizeTrait, PrimitiveArray,
};
use arrow::datatypes::{
    ArrowTemporalType, Date32Type, Date64Type, Float32Type, Float64Type, Int8Type, Int16Type,
    Int32Type, Int64Type, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType, UInt8Type, UInt16Type, UInt32Type, UInt64Type,
};
use chrono::{DateTime, Utc};

use super::logical::LogicalType;
use crate::types::{FieldType, FieldValues};

/// Appends every row of `array` to the buffer, or reports why it cannot.
pub type AppendFn = fn(&mut FieldValues, &dyn Array) -> Result<(), String>;

/// How one logical type lands in a frame field.
#[derive(Debug, Clone, Copy)]
pub struct ColumnConverter {
    pub field_type: FieldType,
    pub append: AppendFn,
}

fn downcast<A: Array + 'static>(array: &dyn Array) -> Result<&A, String> {
    array
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| format!("unexpected array of type {}", array.data_type()))
}

fn buffer_mismatch(found: FieldType, expected: FieldType) -> String {
    format!("field buffer holds {found:?}, expected {expected:?}")
}

fn append_primitive<T: ArrowPrimitiveType>(
    buf: &mut Vec<Option<T::Native>>,
    array: &dyn Array,
) -> Result<(), String> {
    let array = downcast::<PrimitiveArray<T>>(array)?;
    buf.extend(array.iter());
    Ok(())
}

fn append_utf8<O: OffsetSizeTrait>(
    buf: &mut Vec<Option<String>>,
    array: &dyn Array,
) -> Result<(), String> {
    let array = downcast::<GenericStringArray<O>>(array)?;
    buf.extend(array.iter().map(|value| value.map(str::to_owned)));
    Ok(())
}

fn append_boolean(buf: &mut Vec<Option<bool>>, array: &dyn Array) -> Result<(), String> {
    let array = downcast::<BooleanArray>(array)?;
    buf.extend(array.iter());
    Ok(())
}

// Converts into a scratch vector first so an out-of-range value leaves `buf` untouched.
fn append_temporal<T>(buf: &mut Vec<Option<DateTime<Utc>>>, array: &dyn Array) -> Result<(), String>
where
    T: ArrowTemporalType,
    i64: From<T::Native>,
{
    let array = downcast::<PrimitiveArray<T>>(array)?;
    let converted = (0..array.len())
        .map(|idx| {
            if array.is_null(idx) {
                return Ok(None);
            }
            array
                .value_as_datetime(idx)
                .map(|dt| Some(dt.and_utc()))
                .ok_or_else(|| format!("value at row {idx} is out of range for a timestamp"))
        })
        .collect::<Result<Vec<_>, String>>()?;
    buf.extend(converted);
    Ok(())
}

macro_rules! column_appender {
    ($name:ident, $variant:ident, $helper:ident, $arrow:ty) => {
        fn $name(values: &mut FieldValues, array: &dyn Array) -> Result<(), String> {
            match values {
                FieldValues::$variant(buf) => $helper::<$arrow>(buf, array),
                other => Err(buffer_mismatch(other.field_type(), FieldType::$variant)),
            }
        }
    };
}

column_appender!(append_int8, Int8, append_primitive, Int8Type);
column_appender!(append_int16, Int16, append_primitive, Int16Type);
column_appender!(append_int32, Int32, append_primitive, Int32Type);
column_appender!(append_int64, Int64, append_primitive, Int64Type);
column_appender!(append_uint8, Uint8, append_primitive, UInt8Type);
column_appender!(append_uint16, Uint16, append_primitive, UInt16Type);
column_appender!(append_uint32, Uint32, append_primitive, UInt32Type);
column_appender!(append_uint64, Uint64, append_primitive, UInt64Type);
column_appender!(append_float32, Float32, append_primitive, Float32Type);
column_appender!(append_float64, Float64, append_primitive, Float64Type);
column_appender!(append_string, String, append_utf8, i32);
column_appender!(append_large_string, String, append_utf8, i64);
column_appender!(append_date32, Time, append_temporal, Date32Type);
column_appender!(append_date64, Time, append_temporal, Date64Type);
column_appender!(append_ts_second, Time, append_temporal, TimestampSecondType);
column_appender!(append_ts_milli, Time, append_temporal, TimestampMillisecondType);
column_appender!(append_ts_micro, Time, append_temporal, TimestampMicrosecondType);
column_appender!(append_ts_nano, Time, append_temporal, TimestampNanosecondType);

fn append_bool(values: &mut FieldValues, array: &dyn Array) -> Result<(), String> {
    match values {
        FieldValues::Bool(buf) => append_boolean(buf, array),
        other => Err(buffer_mismatch(other.field_type(), FieldType::Bool)),
    }
}

/// The converters every datasource starts with.
pub(crate) fn standard_converters() -> Vec<(LogicalType, ColumnConverter)> {
    let entry = |logical, field_type, append: AppendFn| {
        (logical, ColumnConverter { field_type, append })
    };
    vec![
        entry(LogicalType::Int8, FieldType::Int8, append_int8),
        entry(LogicalType::Int16, FieldType::Int16, append_int16),
        entry(LogicalType::Int32, FieldType::Int32, append_int32),
        entry(LogicalType::Int64, FieldType::Int64, append_int64),
        entry(LogicalType::UInt8, FieldType::Uint8, append_uint8),
        entry(LogicalType::UInt16, FieldType::Uint16, append_uint16),
        entry(LogicalType::UInt32, FieldType::Uint32, append_uint32),
        entry(LogicalType::UInt64, FieldType::Uint64, append_uint64),
        entry(LogicalType::Float32, FieldType::Float32, append_float32),
        entry(LogicalType::Float64, FieldType::Float64, append_float64),
        entry(LogicalType::Boolean, FieldType::Bool, append_bool),
        entry(LogicalType::Utf8, FieldType::String, append_string),
        entry(LogicalType::LargeUtf8, FieldType::String, append_large_string),
        entry(LogicalType::Date32, FieldType::Time, append_date32),
        entry(LogicalType::Date64, FieldType::Time, append_date64),
        entry(LogicalType::Timestamp(TimeUnit::Second), FieldType::Time, append_ts_second),
        entry(LogicalType::Timestamp(TimeUnit::Millisecond), FieldType::Time, append_ts_milli),
        entry(LogicalType::Timestamp(TimeUnit::Microsecond), FieldType::Time, append_ts_micro),
        entry(LogicalType::Timestamp(TimeUnit::Nanosecond), FieldType::Time, append_ts_nano),
    ]
}
