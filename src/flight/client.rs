use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use arrow_flight::sql::client::FlightSqlServiceClient;
use arrow_flight::{FlightInfo, Ticket};
use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use tonic::metadata::{KeyAndValueRef, MetadataMap};
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};

use super::credentials::{PerRpcCredentials, credentials_for};
use super::transport::{EndpointStream, FlightSqlTransport, PlanRequest};
use crate::config::ConnectionSettings;
use crate::error::DatasourceError;

/// Flight SQL transport over a tonic channel.
///
/// The channel is multiplexed, so each call works on its own clone of the client
/// and no lock is held across I/O.
pub struct TonicTransport {
    client: RwLock<Option<FlightSqlServiceClient<Channel>>>,
    credentials: Box<dyn PerRpcCredentials>,
}

impl std::fmt::Debug for TonicTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TonicTransport")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl TonicTransport {
    /// Dial the engine described by `settings` and wait for the connection.
    ///
    /// # Errors
    /// Returns `DatasourceError::ConfigError` for an invalid host, a plaintext host paired
    /// with credentials that require TLS, or unusable trust roots, and
    /// `DatasourceError::ConnectionError` if the engine cannot be reached.
    pub async fn connect(settings: &ConnectionSettings) -> Result<Self, DatasourceError> {
        let credentials = credentials_for(settings.secure, &settings.token);

        let mut endpoint = Endpoint::from_shared(settings.endpoint_uri()).map_err(|e| {
            DatasourceError::ConfigError(format!("flightsql: invalid host {}: {e}", settings.host))
        })?;
        check_channel_security(&endpoint, credentials.as_ref())?;

        if credentials.require_transport_security() {
            endpoint = endpoint
                .tls_config(system_tls_config()?)
                .map_err(|e| DatasourceError::ConfigError(format!("x509: {e}")))?;
        }

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| DatasourceError::ConnectionError(format!("flightsql: {e}")))?;

        tracing::debug!(host = %settings.host, secure = settings.secure, "flightsql channel established");

        Ok(Self {
            client: RwLock::new(Some(FlightSqlServiceClient::new(channel))),
            credentials,
        })
    }

    fn read_client(&self) -> RwLockReadGuard<'_, Option<FlightSqlServiceClient<Channel>>> {
        match self.client.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_client(&self) -> RwLockWriteGuard<'_, Option<FlightSqlServiceClient<Channel>>> {
        match self.client.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// A per-call client carrying the credential metadata and `headers`.
    fn call_client(
        &self,
        headers: &MetadataMap,
    ) -> Result<FlightSqlServiceClient<Channel>, DatasourceError> {
        let mut client = (*self.read_client())
            .clone()
            .ok_or(DatasourceError::TransportClosed)?;
        for (key, value) in self.credentials.request_metadata() {
            client.set_header(key, value);
        }
        for entry in headers.iter() {
            // Binary (-bin) keys are never produced by this crate.
            if let KeyAndValueRef::Ascii(key, value) = entry {
                let value = value.to_str().map_err(|e| {
                    DatasourceError::RequestError(format!("header {}: {e}", key.as_str()))
                })?;
                client.set_header(key.as_str(), value);
            }
        }
        Ok(client)
    }
}

/// Refuse to build a plaintext channel for credentials that require TLS.
///
/// tonic only applies a TLS config to `https` endpoints, so an `http` host would
/// otherwise send the bearer token in cleartext.
fn check_channel_security(
    endpoint: &Endpoint,
    credentials: &dyn PerRpcCredentials,
) -> Result<(), DatasourceError> {
    if credentials.require_transport_security() && endpoint.uri().scheme_str() != Some("https") {
        return Err(DatasourceError::ConfigError(format!(
            "flightsql: secure credentials require an https host, got {}",
            endpoint.uri()
        )));
    }
    Ok(())
}

/// TLS settings backed by the system trust store.
fn system_tls_config() -> Result<ClientTlsConfig, DatasourceError> {
    let loaded = rustls_native_certs::load_native_certs();
    if loaded.certs.is_empty() {
        let detail = loaded
            .errors
            .first()
            .map_or_else(|| "no system trust roots found".to_string(), ToString::to_string);
        return Err(DatasourceError::ConfigError(format!("x509: {detail}")));
    }
    for err in &loaded.errors {
        tracing::warn!(error = %err, "skipped unreadable system certificate");
    }
    Ok(ClientTlsConfig::new().with_native_roots())
}

#[async_trait]
impl FlightSqlTransport for TonicTransport {
    async fn plan(
        &self,
        request: &PlanRequest,
        headers: &MetadataMap,
    ) -> Result<FlightInfo, DatasourceError> {
        let mut client = self.call_client(headers)?;
        let result = match request {
            PlanRequest::Statement(sql) => client.execute(sql.clone(), None).await,
            PlanRequest::SqlInfo(infos) => client.get_sql_info(infos.clone()).await,
            PlanRequest::Tables(command) => client.get_tables(command.clone()).await,
        };
        result.map_err(|e| DatasourceError::ExecutionError(e.to_string()))
    }

    async fn stream(
        &self,
        ticket: Ticket,
        headers: &MetadataMap,
    ) -> Result<EndpointStream, DatasourceError> {
        let mut client = self.call_client(headers)?;
        let stream = client
            .do_get(ticket)
            .await
            .map_err(|e| DatasourceError::ExecutionError(e.to_string()))?;
        let mut batches = Box::pin(stream.peekable());

        // The schema message precedes the first batch; peeking reads it even when
        // no rows follow. A failed peek is surfaced by the first read instead.
        let _ = batches.as_mut().peek().await;
        let schema = batches.as_ref().get_ref().get_ref().schema().cloned();

        Ok(EndpointStream::new(
            schema,
            batches.map_err(DatasourceError::from).boxed(),
        ))
    }

    async fn close(&self) -> Result<(), DatasourceError> {
        let taken = self.write_client().take();
        match taken {
            Some(client) => {
                drop(client);
                tracing::debug!("flightsql channel closed");
                Ok(())
            }
            None => Err(DatasourceError::TransportClosed),
        }
    }
}
