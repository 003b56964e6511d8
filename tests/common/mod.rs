#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use arrow_flight::error::FlightError;
use arrow_flight::{FlightEndpoint, FlightInfo, Ticket};
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;

use flightsql_datasource::DatasourceError;
use flightsql_datasource::flight::{EndpointStream, FlightSqlTransport, PlanRequest};
use tonic::metadata::MetadataMap;

pub mod engine;

/// What the mock engine does for one plan key.
#[derive(Clone)]
pub enum Script {
    /// The plan call fails with this message.
    PlanError(String),
    /// The plan succeeds with this many endpoints and no rows behind them.
    Endpoints(usize),
    /// One endpoint whose stream yields `items`; `schema` is declared on the plan.
    Rows {
        schema: Option<SchemaRef>,
        items: Vec<Result<RecordBatch, String>>,
    },
    /// One endpoint whose stream announces `schema` and ends without rows.
    /// The plan declares no schema.
    NoRows(SchemaRef),
    /// The plan call never completes.
    Hang,
    /// The plan call panics.
    Panic,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub method: &'static str,
    pub key: String,
    pub headers: MetadataMap,
}

/// Scripted in-memory Flight SQL engine.
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<Call>>,
    closed: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, key: &str, script: Script) -> Self {
        self.scripts.lock().unwrap().insert(key.to_string(), script);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stream_calls(&self) -> usize {
        self.calls().iter().filter(|c| c.method == "stream").count()
    }

    fn record(&self, method: &'static str, key: &str, headers: &MetadataMap) {
        self.calls.lock().unwrap().push(Call {
            method,
            key: key.to_string(),
            headers: headers.clone(),
        });
    }

    fn lookup(&self, key: &str) -> Option<Script> {
        self.scripts.lock().unwrap().get(key).cloned()
    }
}

/// Plan key: the SQL text for statements, a fixed name for metadata commands.
pub fn plan_key(request: &PlanRequest) -> String {
    match request {
        PlanRequest::Statement(sql) => sql.clone(),
        PlanRequest::SqlInfo(_) => "sql_info".to_string(),
        PlanRequest::Tables(cmd) if cmd.include_schema => "tables_with_schema".to_string(),
        PlanRequest::Tables(_) => "tables".to_string(),
    }
}

fn endpoint(key: &str) -> FlightEndpoint {
    FlightEndpoint::new().with_ticket(Ticket::new(key.to_string()))
}

#[async_trait]
impl FlightSqlTransport for MockTransport {
    async fn plan(
        &self,
        request: &PlanRequest,
        headers: &MetadataMap,
    ) -> Result<FlightInfo, DatasourceError> {
        let key = plan_key(request);
        self.record("plan", &key, headers);
        match self.lookup(&key) {
            None => Err(DatasourceError::ExecutionError(format!("no script for {key}"))),
            Some(Script::PlanError(message)) => Err(DatasourceError::ExecutionError(message)),
            Some(Script::Hang) => std::future::pending().await,
            Some(Script::Panic) => panic!("scripted panic for {key}"),
            Some(Script::Endpoints(count)) => {
                let mut info = FlightInfo::new();
                for _ in 0..count {
                    info = info.with_endpoint(endpoint(&key));
                }
                Ok(info)
            }
            Some(Script::NoRows(_)) => Ok(FlightInfo::new().with_endpoint(endpoint(&key))),
            Some(Script::Rows { schema, .. }) => {
                let mut info = FlightInfo::new().with_endpoint(endpoint(&key));
                if let Some(schema) = schema {
                    info = info.try_with_schema(schema.as_ref())?;
                }
                Ok(info)
            }
        }
    }

    async fn stream(
        &self,
        ticket: Ticket,
        headers: &MetadataMap,
    ) -> Result<EndpointStream, DatasourceError> {
        let key = String::from_utf8_lossy(&ticket.ticket).into_owned();
        self.record("stream", &key, headers);
        let (schema, items) = match self.lookup(&key) {
            Some(Script::Rows { items, .. }) => (None, items),
            Some(Script::NoRows(schema)) => (Some(schema), Vec::new()),
            _ => (None, Vec::new()),
        };
        let items = items.into_iter().map(|item| {
            item.map_err(|message| DatasourceError::from(FlightError::ProtocolError(message)))
        });
        Ok(EndpointStream::new(schema, stream::iter(items).boxed()))
    }

    async fn close(&self) -> Result<(), DatasourceError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            Err(DatasourceError::TransportClosed)
        } else {
            Ok(())
        }
    }
}

pub fn int_batch(name: &str, values: Vec<Option<i64>>) -> RecordBatch {
    let column: ArrayRef = Arc::new(Int64Array::from(values));
    RecordBatch::try_from_iter(vec![(name, column)]).unwrap()
}

pub fn metric_batch(hosts: Vec<&str>, values: Vec<Option<i64>>) -> RecordBatch {
    let host: ArrayRef = Arc::new(StringArray::from(hosts));
    let value: ArrayRef = Arc::new(Int64Array::from(values));
    RecordBatch::try_from_iter(vec![("host", host), ("value", value)]).unwrap()
}

/// Rows script whose schema is declared from the first batch.
pub fn rows(batches: Vec<RecordBatch>) -> Script {
    Script::Rows {
        schema: batches.first().map(RecordBatch::schema),
        items: batches.into_iter().map(Ok).collect(),
    }
}
