use serde::Serialize;

use crate::types::{FieldType, FieldValues};

/// A named column of a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(flatten)]
    pub values: FieldValues,
}

impl Field {
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            values: FieldValues::new(field_type),
        }
    }

    #[must_use]
    pub fn field_type(&self) -> FieldType {
        self.values.field_type()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameMeta {
    /// The statement the frame was produced by.
    #[serde(rename = "executedQueryString", skip_serializing_if = "Option::is_none")]
    pub executed_query_string: Option<String>,
}

/// The host's table representation: one schema, one typed buffer per column.
///
/// Fields are kept at equal length; rows are appended a batch at a time by the
/// converter and never rewritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub name: String,
    pub fields: Vec<Field>,
    pub meta: FrameMeta,
}

impl Frame {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            meta: FrameMeta::default(),
        }
    }

    #[must_use]
    pub fn with_executed_query(mut self, sql: impl Into<String>) -> Self {
        self.meta.executed_query_string = Some(sql.into());
        self
    }

    /// Number of rows accumulated so far.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.fields.first().map_or(0, Field::len)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}
