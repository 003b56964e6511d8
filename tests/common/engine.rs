//! Loopback Flight SQL engine for exercising the tonic transport end to end.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use arrow_flight::encode::FlightDataEncoderBuilder;
use arrow_flight::flight_service_server::{FlightService, FlightServiceServer};
use arrow_flight::sql::server::FlightSqlService;
use arrow_flight::sql::{CommandStatementQuery, ProstMessageExt, SqlInfo, TicketStatementQuery};
use arrow_flight::{FlightDescriptor, FlightEndpoint, FlightInfo, Ticket};
use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt, stream};
use prost::Message;
use tokio::net::TcpListener;
use tonic::metadata::MetadataMap;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use flightsql_datasource::flight::BUCKET_NAME_KEY;

/// Metadata the engine saw on one call.
#[derive(Debug, Clone, PartialEq)]
pub struct SeenCall {
    pub method: &'static str,
    pub authorization: Option<String>,
    pub bucket: Option<String>,
}

/// Statement engine that answers every query with the same rows.
#[derive(Clone)]
pub struct TestEngine {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
    endpoints: usize,
    declare_schema: bool,
    seen: Arc<Mutex<Vec<SeenCall>>>,
}

impl TestEngine {
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self {
            schema,
            batches,
            endpoints: 1,
            declare_schema: true,
            seen: Arc::default(),
        }
    }

    /// Plan every statement with `count` endpoints.
    pub fn endpoints(mut self, count: usize) -> Self {
        self.endpoints = count;
        self
    }

    /// Leave the plan's schema empty; only the stream announces it.
    pub fn undeclared(mut self) -> Self {
        self.declare_schema = false;
        self
    }

    /// Serve on an ephemeral loopback port until the test runtime shuts down.
    pub async fn spawn(self) -> RunningEngine {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::clone(&self.seen);

        let incoming = stream::unfold(listener, |listener| async move {
            let conn = listener.accept().await.map(|(socket, _)| socket);
            Some((conn, listener))
        })
        .boxed();
        tokio::spawn(
            Server::builder()
                .add_service(FlightServiceServer::new(self))
                .serve_with_incoming(incoming),
        );

        RunningEngine { addr, seen }
    }

    fn observe(&self, method: &'static str, metadata: &MetadataMap) {
        let text = |key: &str| {
            metadata
                .get(key)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.seen.lock().unwrap().push(SeenCall {
            method,
            authorization: text("authorization"),
            bucket: text(BUCKET_NAME_KEY),
        });
    }
}

pub struct RunningEngine {
    addr: SocketAddr,
    seen: Arc<Mutex<Vec<SeenCall>>>,
}

impl RunningEngine {
    /// Host as the datasource settings spell it, without a scheme.
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn url(&self, scheme: &str) -> String {
        format!("{scheme}://{}", self.addr)
    }

    pub fn seen(&self) -> Vec<SeenCall> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl FlightSqlService for TestEngine {
    type FlightService = TestEngine;

    async fn get_flight_info_statement(
        &self,
        query: CommandStatementQuery,
        request: Request<FlightDescriptor>,
    ) -> Result<Response<FlightInfo>, Status> {
        self.observe("plan", request.metadata());

        let handle = TicketStatementQuery {
            statement_handle: query.query.into(),
        };
        let ticket = Ticket::new(handle.as_any().encode_to_vec());

        let mut info = FlightInfo::new();
        if self.declare_schema {
            info = info
                .try_with_schema(self.schema.as_ref())
                .map_err(|e| Status::internal(e.to_string()))?;
        }
        for _ in 0..self.endpoints {
            info = info.with_endpoint(FlightEndpoint::new().with_ticket(ticket.clone()));
        }
        Ok(Response::new(info))
    }

    async fn do_get_statement(
        &self,
        _ticket: TicketStatementQuery,
        request: Request<Ticket>,
    ) -> Result<Response<<Self as FlightService>::DoGetStream>, Status> {
        self.observe("get", request.metadata());

        let batches = stream::iter(self.batches.clone().into_iter().map(Ok));
        let encoded = FlightDataEncoderBuilder::new()
            .with_schema(Arc::clone(&self.schema))
            .build(batches)
            .map_err(Status::from);
        Ok(Response::new(encoded.boxed()))
    }

    async fn register_sql_info(&self, _id: i32, _result: &SqlInfo) {}
}
