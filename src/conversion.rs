//! Arrow record batch to frame conversion.
//!
//! The host's frame layout and Arrow's type catalog are independent designs, so
//! each supported logical type gets its own explicit append routine instead of
//! going through a generic bridge. The mapping lives in a [`Converter`] built
//! once per datasource; there is no process-wide registry.
//!
//! Batches are appended one at a time into a [`FrameBuilder`]; memory grows with
//! the accumulated rows, the wire buffers are never duplicated wholesale.

mod columns;
mod logical;

use std::collections::HashMap;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

pub use columns::{AppendFn, ColumnConverter};
pub use logical::LogicalType;

use crate::error::DatasourceError;
use crate::results::{Field, Frame};

/// Lookup table from logical type to its column converter.
#[derive(Debug, Clone)]
pub struct Converter {
    converters: HashMap<LogicalType, ColumnConverter>,
}

impl Default for Converter {
    fn default() -> Self {
        Self {
            converters: columns::standard_converters().into_iter().collect(),
        }
    }
}

impl Converter {
    /// Converter with every built-in mapping registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Converter with no mappings; every column is unsupported until registered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Add or replace the converter for `logical`.
    pub fn register(&mut self, logical: LogicalType, converter: ColumnConverter) {
        self.converters.insert(logical, converter);
    }

    #[must_use]
    pub fn supports(&self, logical: LogicalType) -> bool {
        self.converters.contains_key(&logical)
    }

    /// Start a frame for `schema`.
    ///
    /// # Errors
    ///
    /// Returns `DatasourceError::UnsupportedType` naming the first column whose type
    /// has no converter.
    pub fn frame_builder(
        &self,
        schema: &SchemaRef,
        sql: &str,
    ) -> Result<FrameBuilder<'_>, DatasourceError> {
        let mut frame = Frame::new("").with_executed_query(sql);
        let mut columns = Vec::with_capacity(schema.fields().len());

        for field in schema.fields() {
            let resolved = LogicalType::of(field.data_type())
                .and_then(|logical| self.converters.get(&logical).map(|conv| (logical, conv)));
            let Some((logical, converter)) = resolved else {
                return Err(DatasourceError::UnsupportedType {
                    column: field.name().clone(),
                    data_type: field.data_type().to_string(),
                });
            };
            frame.fields.push(Field::new(field.name().as_str(), converter.field_type));
            columns.push((logical, converter));
        }

        Ok(FrameBuilder { frame, columns })
    }
}

/// A frame under construction, fed one record batch at a time.
#[derive(Debug)]
pub struct FrameBuilder<'c> {
    frame: Frame,
    columns: Vec<(LogicalType, &'c ColumnConverter)>,
}

impl FrameBuilder<'_> {
    /// Append every column of `batch`, keeping row order and null positions.
    ///
    /// Either the whole batch lands or none of it does, so fields always stay
    /// the same length.
    ///
    /// # Errors
    ///
    /// Returns `DatasourceError::ConversionError` if the batch does not match the
    /// declared schema or a value cannot be represented.
    pub fn append(&mut self, batch: &RecordBatch) -> Result<(), DatasourceError> {
        if batch.num_columns() != self.columns.len() {
            return Err(DatasourceError::ConversionError {
                column: String::from("*"),
                message: format!(
                    "batch has {} columns, schema declares {}",
                    batch.num_columns(),
                    self.columns.len()
                ),
            });
        }

        for ((logical, _), (field, array)) in self
            .columns
            .iter()
            .zip(self.frame.fields.iter().zip(batch.columns()))
        {
            if LogicalType::of(array.data_type()) != Some(*logical) {
                return Err(DatasourceError::ConversionError {
                    column: field.name.clone(),
                    message: format!("expected {logical:?}, batch carries {}", array.data_type()),
                });
            }
        }

        let rows_before = self.frame.row_count();
        let mut failure = None;
        for ((_, converter), (field, array)) in self
            .columns
            .iter()
            .zip(self.frame.fields.iter_mut().zip(batch.columns()))
        {
            field.values.reserve(batch.num_rows());
            if let Err(message) = (converter.append)(&mut field.values, array.as_ref()) {
                failure = Some(DatasourceError::ConversionError {
                    column: field.name.clone(),
                    message,
                });
                break;
            }
        }

        if let Some(err) = failure {
            for field in &mut self.frame.fields {
                field.values.truncate(rows_before);
            }
            return Err(err);
        }
        Ok(())
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.frame.row_count()
    }

    #[must_use]
    pub fn finish(self) -> Frame {
        self.frame
    }
}
