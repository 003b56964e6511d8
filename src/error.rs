use thiserror::Error;

use arrow::error::ArrowError;
use arrow_flight::error::FlightError;

use crate::results::ResponseStatus;

#[derive(Debug, Error)]
pub enum DatasourceError {
    #[error(transparent)]
    ArrowError(#[from] ArrowError),

    #[error(transparent)]
    FlightError(#[from] FlightError),

    #[error(transparent)]
    TransportError(#[from] tonic::transport::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("{0}")]
    RequestError(String),

    #[error("flightsql: {0}")]
    ExecutionError(String),

    #[error("unsupported endpoint count in response: {0}")]
    UnsupportedEndpointCount(usize),

    #[error("unsupported arrow type {data_type} for column {column}")]
    UnsupportedType { column: String, data_type: String },

    #[error("conversion error in column {column}: {message}")]
    ConversionError { column: String, message: String },

    #[error("query cancelled: {0}")]
    Cancelled(String),

    #[error("transport already closed")]
    TransportClosed,

    #[error("Other error: {0}")]
    Other(String),
}

impl DatasourceError {
    /// How the host should classify this error on a query response.
    #[must_use]
    pub fn status(&self) -> ResponseStatus {
        match self {
            Self::RequestError(_) | Self::JsonError(_) => ResponseStatus::BadRequest,
            _ => ResponseStatus::Internal,
        }
    }
}
