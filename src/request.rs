use serde::Deserialize;

use crate::error::DatasourceError;

/// One query as the host hands it over: an id plus its untyped JSON payload.
#[derive(Debug, Clone, Default)]
pub struct DataQuery {
    pub ref_id: String,
    pub json: Vec<u8>,
}

impl DataQuery {
    #[must_use]
    pub fn new(ref_id: impl Into<String>, json: impl Into<Vec<u8>>) -> Self {
        Self {
            ref_id: ref_id.into(),
            json: json.into(),
        }
    }
}

/// A batch of queries, answered together.
#[derive(Debug, Clone, Default)]
pub struct QueryDataRequest {
    pub queries: Vec<DataQuery>,
}

impl QueryDataRequest {
    #[must_use]
    pub fn new(queries: Vec<DataQuery>) -> Self {
        Self { queries }
    }
}

/// Typed form of a query payload. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(default)]
    pub ref_id: String,
    pub query_text: String,
    #[serde(default, rename = "intervalMs")]
    pub interval_ms: i64,
    #[serde(default)]
    pub max_data_points: i64,
}

impl QueryRequest {
    /// Decode a query payload.
    ///
    /// # Errors
    ///
    /// Returns `DatasourceError::RequestError` if the payload is not valid JSON for
    /// this shape or the query text is blank.
    pub fn parse(json: &[u8]) -> Result<Self, DatasourceError> {
        let request: QueryRequest = serde_json::from_slice(json)
            .map_err(|e| DatasourceError::RequestError(format!("unmarshal query request: {e}")))?;
        if request.query_text.trim().is_empty() {
            return Err(DatasourceError::RequestError(
                "unmarshal query request: queryText is empty".into(),
            ));
        }
        Ok(request)
    }
}
