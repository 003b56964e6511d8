use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::UInt32Type;
use arrow::ipc::convert::try_schema_from_ipc_buffer;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use arrow_flight::sql::{CommandGetTables, SqlInfo};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::error::DatasourceError;
use crate::executor::{QueryContext, QueryExecutor};
use crate::flight::PlanRequest;
use crate::results::Frame;

const SQL_INFO_KEYS: [SqlInfo; 6] = [
    SqlInfo::FlightSqlServerName,
    SqlInfo::FlightSqlServerVersion,
    SqlInfo::FlightSqlServerArrowVersion,
    SqlInfo::SqlKeywords,
    SqlInfo::SqlNumericFunctions,
    SqlInfo::SqlStringFunctions,
];

/// Failure of a resource call, rendered as a status plus plain-text message.
pub(crate) enum ResourceError {
    BadRequest(String),
    Internal(String),
}

impl From<DatasourceError> for ResourceError {
    fn from(err: DatasourceError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ResourceError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Internal(message) => {
                tracing::warn!(error = %message, "resource call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}

/// One server capability as reported by `/get-sql-info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlInfoEntry {
    pub info_name: u32,
    pub value: String,
}

/// One column as reported by `/get-columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ColumnsParams {
    table: Option<String>,
}

pub(crate) async fn get_sql_info(
    State(executor): State<Arc<QueryExecutor>>,
) -> Result<Json<Vec<SqlInfoEntry>>, ResourceError> {
    let request = PlanRequest::SqlInfo(SQL_INFO_KEYS.to_vec());
    let batches = executor
        .fetch_batches(&QueryContext::new(), &request)
        .await?;

    let mut entries = Vec::new();
    for batch in &batches {
        render_sql_info(batch, &mut entries)?;
    }
    Ok(Json(entries))
}

fn render_sql_info(batch: &RecordBatch, out: &mut Vec<SqlInfoEntry>) -> Result<(), DatasourceError> {
    let names = batch
        .column_by_name("info_name")
        .and_then(|col| col.as_primitive_opt::<UInt32Type>())
        .ok_or_else(|| DatasourceError::ExecutionError("sql info batch lacks info_name".into()))?;
    let values = batch
        .column_by_name("value")
        .ok_or_else(|| DatasourceError::ExecutionError("sql info batch lacks value".into()))?;

    for row in 0..batch.num_rows() {
        if names.is_null(row) {
            continue;
        }
        out.push(SqlInfoEntry {
            info_name: names.value(row),
            value: render_value(values.as_ref(), row)?,
        });
    }
    Ok(())
}

// Union values render as the selected child's value, not the `{type=value}` form.
fn render_value(array: &dyn Array, row: usize) -> Result<String, DatasourceError> {
    match array.as_union_opt() {
        Some(union) => {
            let child = union.child(union.type_id(row));
            Ok(array_value_to_string(child.as_ref(), union.value_offset(row))?)
        }
        None => Ok(array_value_to_string(array, row)?),
    }
}

pub(crate) async fn get_tables(
    State(executor): State<Arc<QueryExecutor>>,
) -> Result<Json<Vec<Frame>>, ResourceError> {
    let request = PlanRequest::Tables(CommandGetTables::default());
    let response = executor
        .query_plan(&QueryContext::new(), &request, "get-tables")
        .await;
    match response.error {
        Some(error) => Err(ResourceError::Internal(error.message)),
        None => Ok(Json(response.frames)),
    }
}

pub(crate) async fn get_columns(
    State(executor): State<Arc<QueryExecutor>>,
    Query(params): Query<ColumnsParams>,
) -> Result<Json<Vec<ColumnInfo>>, ResourceError> {
    let table = params
        .table
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ResourceError::BadRequest("missing table parameter".into()))?;

    let request = PlanRequest::Tables(CommandGetTables {
        table_name_filter_pattern: Some(table.clone()),
        include_schema: true,
        ..CommandGetTables::default()
    });
    let batches = executor
        .fetch_batches(&QueryContext::new(), &request)
        .await?;

    let Some(schema_bytes) = table_schema(&batches, &table)? else {
        tracing::debug!(%table, "no table matched");
        return Ok(Json(Vec::new()));
    };
    let schema = try_schema_from_ipc_buffer(&schema_bytes).map_err(DatasourceError::from)?;
    let columns = schema
        .fields()
        .iter()
        .map(|field| ColumnInfo {
            name: field.name().clone(),
            data_type: field.data_type().to_string(),
            nullable: field.is_nullable(),
        })
        .collect();
    Ok(Json(columns))
}

/// Schema of the listed table named exactly `table`.
///
/// The filter pattern is a LIKE pattern, so `_` and `%` in the name can match
/// other tables too.
fn table_schema(
    batches: &[RecordBatch],
    table: &str,
) -> Result<Option<Vec<u8>>, DatasourceError> {
    for batch in batches {
        let names = batch
            .column_by_name("table_name")
            .and_then(|col| col.as_string_opt::<i32>())
            .ok_or_else(|| {
                DatasourceError::ExecutionError("table listing lacks table_name".into())
            })?;
        let schemas = batch
            .column_by_name("table_schema")
            .and_then(|col| col.as_binary_opt::<i32>())
            .ok_or_else(|| {
                DatasourceError::ExecutionError("table listing lacks table_schema".into())
            })?;
        let found = names
            .iter()
            .zip(schemas.iter())
            .find_map(|(name, bytes)| (name == Some(table)).then_some(bytes).flatten());
        if let Some(bytes) = found {
            return Ok(Some(bytes.to_vec()));
        }
    }
    Ok(None)
}
