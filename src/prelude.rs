//! Convenient imports for common functionality.
//!
//! This module re-exports the types most callers need to configure a
//! datasource, run queries and read the resulting frames.

pub use crate::config::{ConnectionSettings, ConnectionSettingsBuilder, DatasourceSettings};
pub use crate::datasource::FlightSqlDatasource;
pub use crate::error::DatasourceError;
pub use crate::executor::QueryContext;
pub use crate::request::{DataQuery, QueryDataRequest};
pub use crate::results::{
    CheckHealthResult, DataResponse, Field, Frame, HealthStatus, QueryDataResponse,
    ResponseStatus,
};
pub use crate::types::{FieldType, FieldValues};
