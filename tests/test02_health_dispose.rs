mod common;

use std::sync::Arc;

use common::{MockTransport, Script, int_batch, rows};
use flightsql_datasource::flight::FlightSqlTransport;
use flightsql_datasource::prelude::*;

#[tokio::test]
async fn health_ok_when_select_succeeds() {
    let mock = Arc::new(MockTransport::new().script("select 1", rows(vec![int_batch("1", vec![Some(1)])])));
    let ds = FlightSqlDatasource::with_transport("metrics", mock.clone());

    let result = ds.check_health(&QueryContext::new()).await;
    assert_eq!(result.status, HealthStatus::Ok);
    assert_eq!(result.message, "OK");
    assert_eq!(mock.calls()[0].key, "select 1");
}

#[tokio::test]
async fn health_error_carries_the_failure() {
    let mock = Arc::new(MockTransport::new().script(
        "select 1",
        Script::PlanError("connection refused".into()),
    ));
    let ds = FlightSqlDatasource::with_transport("metrics", mock.clone());

    let result = ds.check_health(&QueryContext::new()).await;
    assert_eq!(result.status, HealthStatus::Error);
    assert_eq!(result.message, "ERROR: flightsql: connection refused");
}

#[tokio::test]
async fn health_error_on_endpoint_count() {
    let mock = Arc::new(MockTransport::new().script("select 1", Script::Endpoints(3)));
    let ds = FlightSqlDatasource::with_transport("metrics", mock.clone());

    let result = ds.check_health(&QueryContext::new()).await;
    assert_eq!(result.status, HealthStatus::Error);
    assert_eq!(
        result.message,
        "ERROR: unsupported endpoint count in response: 3"
    );
}

#[tokio::test]
async fn health_serializes_uppercase_status() {
    let mock = Arc::new(MockTransport::new().script("select 1", Script::Endpoints(0)));
    let ds = FlightSqlDatasource::with_transport("metrics", mock.clone());

    let result = ds.check_health(&QueryContext::new()).await;
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "ERROR");
}

#[tokio::test]
async fn dispose_twice_does_not_panic() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mock = Arc::new(MockTransport::new());
    let ds = FlightSqlDatasource::with_transport("metrics", mock.clone());

    ds.dispose().await;
    // The second close fails inside the transport; dispose only logs it.
    ds.dispose().await;

    assert!(matches!(
        mock.close().await,
        Err(DatasourceError::TransportClosed)
    ));
}
