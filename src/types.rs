use chrono::{DateTime, Utc};
use serde::Serialize;

/// Host-side field types a frame column can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Bool,
    String,
    Time,
}

/// Append-only column buffer for a single frame field.
///
/// Every variant stores `Option<T>`; `None` is the null marker for that row.
/// ```rust
/// use flightsql_datasource::prelude::*;
///
/// let mut values = FieldValues::new(FieldType::Int64);
/// if let FieldValues::Int64(buf) = &mut values {
///     buf.extend([Some(1), None, Some(3)]);
/// }
/// assert_eq!(values.len(), 3);
/// assert!(values.is_null(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum FieldValues {
    Int8(Vec<Option<i8>>),
    Int16(Vec<Option<i16>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Uint8(Vec<Option<u8>>),
    Uint16(Vec<Option<u16>>),
    Uint32(Vec<Option<u32>>),
    Uint64(Vec<Option<u64>>),
    Float32(Vec<Option<f32>>),
    Float64(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    String(Vec<Option<String>>),
    Time(Vec<Option<DateTime<Utc>>>),
}

macro_rules! for_each_buffer {
    ($values:expr, $buf:ident => $body:expr) => {
        match $values {
            FieldValues::Int8($buf) => $body,
            FieldValues::Int16($buf) => $body,
            FieldValues::Int32($buf) => $body,
            FieldValues::Int64($buf) => $body,
            FieldValues::Uint8($buf) => $body,
            FieldValues::Uint16($buf) => $body,
            FieldValues::Uint32($buf) => $body,
            FieldValues::Uint64($buf) => $body,
            FieldValues::Float32($buf) => $body,
            FieldValues::Float64($buf) => $body,
            FieldValues::Bool($buf) => $body,
            FieldValues::String($buf) => $body,
            FieldValues::Time($buf) => $body,
        }
    };
}

impl FieldValues {
    /// Empty buffer for the given field type.
    #[must_use]
    pub fn new(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Int8 => Self::Int8(Vec::new()),
            FieldType::Int16 => Self::Int16(Vec::new()),
            FieldType::Int32 => Self::Int32(Vec::new()),
            FieldType::Int64 => Self::Int64(Vec::new()),
            FieldType::Uint8 => Self::Uint8(Vec::new()),
            FieldType::Uint16 => Self::Uint16(Vec::new()),
            FieldType::Uint32 => Self::Uint32(Vec::new()),
            FieldType::Uint64 => Self::Uint64(Vec::new()),
            FieldType::Float32 => Self::Float32(Vec::new()),
            FieldType::Float64 => Self::Float64(Vec::new()),
            FieldType::Bool => Self::Bool(Vec::new()),
            FieldType::String => Self::String(Vec::new()),
            FieldType::Time => Self::Time(Vec::new()),
        }
    }

    #[must_use]
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Int8(_) => FieldType::Int8,
            Self::Int16(_) => FieldType::Int16,
            Self::Int32(_) => FieldType::Int32,
            Self::Int64(_) => FieldType::Int64,
            Self::Uint8(_) => FieldType::Uint8,
            Self::Uint16(_) => FieldType::Uint16,
            Self::Uint32(_) => FieldType::Uint32,
            Self::Uint64(_) => FieldType::Uint64,
            Self::Float32(_) => FieldType::Float32,
            Self::Float64(_) => FieldType::Float64,
            Self::Bool(_) => FieldType::Bool,
            Self::String(_) => FieldType::String,
            Self::Time(_) => FieldType::Time,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        for_each_buffer!(self, buf => buf.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserve room for `additional` rows ahead of an append.
    pub fn reserve(&mut self, additional: usize) {
        for_each_buffer!(self, buf => buf.reserve(additional));
    }

    /// Drop rows past `len`; used to roll back a partially appended batch.
    pub fn truncate(&mut self, len: usize) {
        for_each_buffer!(self, buf => buf.truncate(len));
    }

    /// Check whether row `idx` holds the null marker. Out-of-range rows are not null.
    #[must_use]
    pub fn is_null(&self, idx: usize) -> bool {
        for_each_buffer!(self, buf => matches!(buf.get(idx), Some(None)))
    }

    #[must_use]
    pub fn as_int64(&self) -> Option<&[Option<i64>]> {
        if let Self::Int64(values) = self {
            Some(values)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float64(&self) -> Option<&[Option<f64>]> {
        if let Self::Float64(values) = self {
            Some(values)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&[Option<bool>]> {
        if let Self::Bool(values) = self {
            Some(values)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_string(&self) -> Option<&[Option<String>]> {
        if let Self::String(values) = self {
            Some(values)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_time(&self) -> Option<&[Option<DateTime<Utc>>]> {
        if let Self::Time(values) = self {
            Some(values)
        } else {
            None
        }
    }
}
