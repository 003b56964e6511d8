//! Datasource adapter for Arrow Flight SQL engines.
//!
//! A [`FlightSqlDatasource`] submits SQL over a Flight SQL channel, streams the
//! single result endpoint back and converts each record batch into a host
//! [`Frame`]. Health checks and a handful of schema-browsing resources ride on
//! the same pipeline.
//!
//! ```rust,no_run
//! use flightsql_datasource::prelude::*;
//!
//! # async fn run() -> Result<(), DatasourceError> {
//! let ds = ConnectionSettingsBuilder::new("localhost:8082".into())
//!     .database("metrics")
//!     .token("secret")
//!     .build()
//!     .await?;
//!
//! let request = QueryDataRequest::new(vec![DataQuery::new(
//!     "A",
//!     r#"{"queryText":"select * from cpu limit 10"}"#,
//! )]);
//! let response = ds.query_data(&QueryContext::new(), request).await;
//! if let Some(frame) = response.get("A").and_then(|r| r.frames.first()) {
//!     println!("{} rows", frame.row_count());
//! }
//! ds.dispose().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod conversion;
pub mod datasource;
pub mod error;
pub mod executor;
pub mod flight;
pub mod prelude;
pub mod request;
pub mod resources;
pub mod results;
pub mod types;

pub use config::{ConnectionSettings, ConnectionSettingsBuilder, DatasourceSettings};
pub use conversion::{Converter, FrameBuilder};
pub use datasource::FlightSqlDatasource;
pub use error::DatasourceError;
pub use executor::{QueryContext, QueryExecutor};
pub use request::{DataQuery, QueryDataRequest, QueryRequest};
pub use results::{
    CheckHealthResult, DataResponse, Field, Frame, HealthStatus, QueryDataResponse,
    ResponseStatus,
};
pub use types::{FieldType, FieldValues};
