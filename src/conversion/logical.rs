use arrow::datatypes::{DataType, TimeUnit};

/// Registry key for a wire column type.
///
/// Parameters that do not change how values are read (the timezone of a
/// timestamp) are dropped so one entry covers them all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Boolean,
    Utf8,
    LargeUtf8,
    Date32,
    Date64,
    Timestamp(TimeUnit),
}

impl LogicalType {
    /// Map an Arrow data type to its key; `None` for types with no key at all.
    #[must_use]
    pub fn of(data_type: &DataType) -> Option<Self> {
        let logical = match data_type {
            DataType::Int8 => Self::Int8,
            DataType::Int16 => Self::Int16,
            DataType::Int32 => Self::Int32,
            DataType::Int64 => Self::Int64,
            DataType::UInt8 => Self::UInt8,
            DataType::UInt16 => Self::UInt16,
            DataType::UInt32 => Self::UInt32,
            DataType::UInt64 => Self::UInt64,
            DataType::Float32 => Self::Float32,
            DataType::Float64 => Self::Float64,
            DataType::Boolean => Self::Boolean,
            DataType::Utf8 => Self::Utf8,
            DataType::LargeUtf8 => Self::LargeUtf8,
            DataType::Date32 => Self::Date32,
            DataType::Date64 => Self::Date64,
            DataType::Timestamp(unit, _) => Self::Timestamp(*unit),
            _ => return None,
        };
        Some(logical)
    }
}
