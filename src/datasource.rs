use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::join_all;
use tower::ServiceExt;

use crate::config::{ConnectionSettings, DatasourceSettings};
use crate::conversion::Converter;
use crate::error::DatasourceError;
use crate::executor::{QueryContext, QueryExecutor};
use crate::flight::{FlightSqlTransport, TonicTransport};
use crate::request::{DataQuery, QueryDataRequest, QueryRequest};
use crate::results::{CheckHealthResult, DataResponse, HealthStatus, QueryDataResponse};
use crate::resources;

const HEALTH_QUERY: &str = "select 1";

/// A configured Flight SQL datasource instance.
///
/// One instance owns one transport; queries, health checks and resource calls
/// all share it and may run concurrently.
#[derive(Debug, Clone)]
pub struct FlightSqlDatasource {
    executor: Arc<QueryExecutor>,
    resources: Router,
}

impl FlightSqlDatasource {
    /// Parse the host's settings and connect.
    ///
    /// # Errors
    ///
    /// Returns `DatasourceError::ConfigError` for unreadable settings or trust roots,
    /// or the transport's error if the engine cannot be reached.
    pub async fn new(settings: &DatasourceSettings) -> Result<Self, DatasourceError> {
        let cfg = ConnectionSettings::from_instance_settings(settings)?;
        Self::connect(cfg).await
    }

    /// Connect with already-parsed settings.
    ///
    /// # Errors
    ///
    /// Returns `DatasourceError` if the channel cannot be set up.
    pub async fn connect(cfg: ConnectionSettings) -> Result<Self, DatasourceError> {
        let transport = TonicTransport::connect(&cfg).await?;
        tracing::info!(host = %cfg.host, database = %cfg.database, "flightsql datasource ready");
        Ok(Self::with_transport(cfg.database, Arc::new(transport)))
    }

    /// Build over any transport, e.g. one scripted in tests.
    #[must_use]
    pub fn with_transport(
        database: impl Into<String>,
        transport: Arc<dyn FlightSqlTransport>,
    ) -> Self {
        Self::from_executor(QueryExecutor::new(transport, database))
    }

    /// Replace the column converter.
    #[must_use]
    pub fn with_converter(self, converter: Converter) -> Self {
        let executor = (*self.executor).clone().with_converter(converter);
        Self::from_executor(executor)
    }

    fn from_executor(executor: QueryExecutor) -> Self {
        let executor = Arc::new(executor);
        Self {
            resources: resources::router(Arc::clone(&executor)),
            executor,
        }
    }

    #[must_use]
    pub fn database(&self) -> &str {
        self.executor.database()
    }

    #[must_use]
    pub fn executor(&self) -> &Arc<QueryExecutor> {
        &self.executor
    }

    /// Answer every query in `request`, one response per reference id.
    ///
    /// Queries run concurrently. A query that fails to parse or execute only
    /// affects its own slot.
    pub async fn query_data(
        &self,
        ctx: &QueryContext,
        request: QueryDataRequest,
    ) -> QueryDataResponse {
        tracing::debug!(queries = request.queries.len(), "query_data");
        let pending = request
            .queries
            .into_iter()
            .map(|query| self.answer(ctx, query));

        let mut response = QueryDataResponse::default();
        for (ref_id, data) in join_all(pending).await {
            response.responses.insert(ref_id, data);
        }
        response
    }

    async fn answer(&self, ctx: &QueryContext, query: DataQuery) -> (String, DataResponse) {
        let data = match QueryRequest::parse(&query.json) {
            Ok(parsed) => self.executor.query(ctx, &parsed.query_text).await,
            Err(err) => {
                tracing::debug!(ref_id = %query.ref_id, error = %err, "rejected query payload");
                DataResponse::from_error(&err)
            }
        };
        (query.ref_id, data)
    }

    /// Run a trivial query and report whether the engine answered cleanly.
    pub async fn check_health(&self, ctx: &QueryContext) -> CheckHealthResult {
        let response = self.executor.query(ctx, HEALTH_QUERY).await;
        match response.error {
            Some(error) => {
                tracing::warn!(error = %error.message, "health check failed");
                CheckHealthResult {
                    status: HealthStatus::Error,
                    message: format!("ERROR: {}", error.message),
                }
            }
            None => CheckHealthResult {
                status: HealthStatus::Ok,
                message: String::from("OK"),
            },
        }
    }

    /// Dispatch a resource request to the resource router.
    pub async fn call_resource(&self, request: Request<Body>) -> Response {
        match self.resources.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    /// Close the transport. Failures are logged, not returned.
    pub async fn dispose(&self) {
        if let Err(err) = self.executor.transport().close().await {
            tracing::error!(error = %err, "closing flightsql transport");
        }
    }
}
