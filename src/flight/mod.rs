// Flight SQL transport - everything that talks to the engine
//
// - credentials: per-call bearer metadata, secure and insecure variants
// - transport: the transport trait plus plan/header/stream types
// - client: tonic-backed transport and channel setup

pub mod client;
pub mod credentials;
pub mod transport;

pub use client::TonicTransport;
pub use credentials::{BearerToken, InsecureBearerToken, PerRpcCredentials, credentials_for};
pub use transport::{
    BUCKET_NAME_KEY, BatchStream, EndpointStream, FlightSqlTransport, PlanRequest, bucket_headers,
};
