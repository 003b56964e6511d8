use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use arrow_flight::sql::{CommandGetTables, SqlInfo};
use arrow_flight::{FlightInfo, Ticket};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use tonic::metadata::{Ascii, MetadataMap, MetadataValue};

use crate::error::DatasourceError;

/// Metadata key multi-tenant engines route on.
pub const BUCKET_NAME_KEY: &str = "bucket-name";

/// Forward-only stream of record batches for one endpoint ticket.
pub type BatchStream = BoxStream<'static, Result<RecordBatch, DatasourceError>>;

/// What the engine is asked to plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanRequest {
    /// A SQL statement.
    Statement(String),
    /// Server capability lookups.
    SqlInfo(Vec<SqlInfo>),
    /// Table listing, optionally with each table's schema.
    Tables(CommandGetTables),
}

impl PlanRequest {
    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Statement(_) => "statement",
            Self::SqlInfo(_) => "sql_info",
            Self::Tables(_) => "tables",
        }
    }
}

/// Batches behind one endpoint ticket, with the schema the stream announced.
///
/// Engines send the schema message ahead of any rows, so `schema` is known even
/// when the result is empty.
pub struct EndpointStream {
    pub schema: Option<SchemaRef>,
    pub batches: BatchStream,
}

impl EndpointStream {
    #[must_use]
    pub fn new(schema: Option<SchemaRef>, batches: BatchStream) -> Self {
        Self { schema, batches }
    }
}

impl std::fmt::Debug for EndpointStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointStream")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Outgoing metadata for one call, tagged with the bucket the engine routes on.
///
/// # Errors
/// Returns `DatasourceError::ConfigError` when `database` is not a valid ASCII
/// metadata value.
pub fn bucket_headers(database: &str) -> Result<MetadataMap, DatasourceError> {
    let value: MetadataValue<Ascii> = database.parse().map_err(|e| {
        DatasourceError::ConfigError(format!("invalid database name {database:?}: {e}"))
    })?;
    let mut headers = MetadataMap::new();
    headers.insert(BUCKET_NAME_KEY, value);
    Ok(headers)
}

/// The channel to a Flight SQL engine.
///
/// Implementations are shared across concurrent queries, so every method takes
/// `&self`.
#[async_trait]
pub trait FlightSqlTransport: Send + Sync {
    /// Submit a request and return the engine's plan with its endpoints.
    async fn plan(
        &self,
        request: &PlanRequest,
        headers: &MetadataMap,
    ) -> Result<FlightInfo, DatasourceError>;

    /// Open the batch stream behind an endpoint ticket.
    async fn stream(
        &self,
        ticket: Ticket,
        headers: &MetadataMap,
    ) -> Result<EndpointStream, DatasourceError>;

    /// Release the channel. Calling this more than once is an error.
    async fn close(&self) -> Result<(), DatasourceError>;
}
