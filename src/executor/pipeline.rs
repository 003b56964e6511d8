use std::sync::Arc;

use arrow::datatypes::{Schema, SchemaRef};
use arrow::ipc::convert::try_schema_from_ipc_buffer;
use arrow::record_batch::RecordBatch;
use arrow_flight::FlightInfo;
use futures_util::TryStreamExt;

use super::context::QueryContext;
use crate::conversion::Converter;
use crate::error::DatasourceError;
use crate::flight::{BatchStream, EndpointStream, FlightSqlTransport, PlanRequest, bucket_headers};
use crate::results::{DataResponse, Frame};

/// A stream opened against the single endpoint of a plan.
///
/// Owning this value owns the stream; dropping it on any path releases the
/// underlying buffers.
pub struct OpenStream {
    /// Schema announced by the stream, else the one declared by the plan.
    pub schema: Option<SchemaRef>,
    pub stream: BatchStream,
}

/// Runs the plan -> endpoint -> stream sequence against one transport.
///
/// Holds no per-query state, so one executor serves concurrent queries.
#[derive(Clone)]
pub struct QueryExecutor {
    transport: Arc<dyn FlightSqlTransport>,
    converter: Arc<Converter>,
    database: String,
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl QueryExecutor {
    #[must_use]
    pub fn new(transport: Arc<dyn FlightSqlTransport>, database: impl Into<String>) -> Self {
        Self {
            transport,
            converter: Arc::new(Converter::new()),
            database: database.into(),
        }
    }

    #[must_use]
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = Arc::new(converter);
        self
    }

    #[must_use]
    pub fn transport(&self) -> &Arc<dyn FlightSqlTransport> {
        &self.transport
    }

    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Plan `request`, insist on exactly one endpoint and open its stream.
    ///
    /// # Errors
    /// Returns `DatasourceError::UnsupportedEndpointCount` when the plan does not carry
    /// exactly one endpoint (no stream is opened), `DatasourceError::ConfigError` when the
    /// database name cannot be sent as metadata, or the transport's error for the plan
    /// and stream-open calls.
    pub async fn open(
        &self,
        ctx: &QueryContext,
        request: &PlanRequest,
    ) -> Result<OpenStream, DatasourceError> {
        let headers = bucket_headers(&self.database)?;

        let info = ctx
            .run("plan", self.transport.plan(request, &headers))
            .await?;
        tracing::debug!(
            kind = request.kind(),
            database = %self.database,
            endpoints = info.endpoint.len(),
            "flightsql plan received"
        );

        if info.endpoint.len() != 1 {
            return Err(DatasourceError::UnsupportedEndpointCount(info.endpoint.len()));
        }
        let declared = declared_schema(&info)?;
        let ticket = info
            .endpoint
            .into_iter()
            .next()
            .and_then(|endpoint| endpoint.ticket)
            .ok_or_else(|| DatasourceError::ExecutionError("endpoint carries no ticket".into()))?;

        let EndpointStream { schema, batches } = ctx
            .run("stream open", self.transport.stream(ticket, &headers))
            .await?;
        Ok(OpenStream {
            schema: schema.or(declared),
            stream: batches,
        })
    }

    /// Run `sql` and convert the result into a single frame.
    pub async fn query(&self, ctx: &QueryContext, sql: &str) -> DataResponse {
        self.query_plan(ctx, &PlanRequest::Statement(sql.to_string()), sql)
            .await
    }

    /// Run any plan request through the frame pipeline. `label` becomes the
    /// frame's executed query string.
    ///
    /// Errors before the stream opens produce an error-only response. Errors while
    /// draining keep the frame built so far next to the error.
    pub async fn query_plan(
        &self,
        ctx: &QueryContext,
        request: &PlanRequest,
        label: &str,
    ) -> DataResponse {
        match self.open(ctx, request).await {
            Ok(open) => self.drain(ctx, open, label).await,
            Err(err) => {
                tracing::debug!(kind = request.kind(), error = %err, "flightsql query failed");
                DataResponse::from_error(&err)
            }
        }
    }

    async fn drain(&self, ctx: &QueryContext, open: OpenStream, label: &str) -> DataResponse {
        let OpenStream { schema, mut stream } = open;
        let empty_frame = || Frame::new("").with_executed_query(label);

        // With no schema from the stream or the plan, the first batch defines it.
        let mut first = None;
        let schema = match schema {
            Some(schema) => schema,
            None => match ctx.run("stream read", stream.try_next()).await {
                Ok(Some(batch)) => {
                    let schema = batch.schema();
                    first = Some(batch);
                    schema
                }
                Ok(None) => Arc::new(Schema::empty()),
                Err(err) => return DataResponse::from_frame(empty_frame()).with_error(&err),
            },
        };

        let mut builder = match self.converter.frame_builder(&schema, label) {
            Ok(builder) => builder,
            Err(err) => return DataResponse::from_frame(empty_frame()).with_error(&err),
        };

        let mut failure = None;
        if let Some(batch) = first {
            if let Err(err) = builder.append(&batch) {
                failure = Some(err);
            }
        }

        while failure.is_none() {
            match ctx.run("stream read", stream.try_next()).await {
                Ok(Some(batch)) => {
                    if let Err(err) = builder.append(&batch) {
                        failure = Some(err);
                    }
                }
                Ok(None) => break,
                Err(err) => failure = Some(err),
            }
        }

        let rows = builder.row_count();
        let response = DataResponse::from_frame(builder.finish());
        match failure {
            Some(err) => {
                tracing::warn!(rows, error = %err, "flightsql stream aborted, returning partial frame");
                response.with_error(&err)
            }
            None => {
                tracing::debug!(rows, "flightsql stream drained");
                response
            }
        }
    }

    /// Collect the raw batches of a plan without converting them.
    ///
    /// # Errors
    /// Returns the first error from planning, opening or reading the stream.
    pub async fn fetch_batches(
        &self,
        ctx: &QueryContext,
        request: &PlanRequest,
    ) -> Result<Vec<RecordBatch>, DatasourceError> {
        let OpenStream { mut stream, .. } = self.open(ctx, request).await?;
        let mut batches = Vec::new();
        while let Some(batch) = ctx.run("stream read", stream.try_next()).await? {
            batches.push(batch);
        }
        Ok(batches)
    }
}

/// Schema carried by the plan; `None` when the engine left it empty.
fn declared_schema(info: &FlightInfo) -> Result<Option<SchemaRef>, DatasourceError> {
    if info.schema.is_empty() {
        return Ok(None);
    }
    let schema = try_schema_from_ipc_buffer(&info.schema)?;
    Ok(Some(Arc::new(schema)))
}
