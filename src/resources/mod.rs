// Resource endpoints - schema browsing for query editors
//
// - handlers: /get-sql-info, /get-tables, /get-columns
// - recover: panic recovery layer wrapping every route

mod handlers;
mod recover;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::executor::QueryExecutor;

pub use handlers::{ColumnInfo, SqlInfoEntry};

/// Build the resource router over a shared executor.
///
/// Routes:
/// - `GET /get-sql-info` - server name, versions and supported functions
/// - `GET /get-tables` - table listing as a frame
/// - `GET /get-columns?table=<name>` - columns of one table
pub fn router(executor: Arc<QueryExecutor>) -> Router {
    Router::new()
        .route("/get-sql-info", get(handlers::get_sql_info))
        .route("/get-tables", get(handlers::get_tables))
        .route("/get-columns", get(handlers::get_columns))
        .with_state(executor)
        .layer(axum::middleware::from_fn(recover::recover_panics))
}
