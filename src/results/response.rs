use std::collections::BTreeMap;

use serde::Serialize;

use super::frame::Frame;
use crate::error::DatasourceError;

/// Error classification reported back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    BadRequest,
    Internal,
}

impl ResponseStatus {
    /// HTTP-equivalent status code.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Internal => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseError {
    pub status: ResponseStatus,
    pub message: String,
}

/// The result slot for one reference id.
///
/// A response may carry both frames and an error: a stream that fails after some
/// batches were converted keeps the rows it already produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataResponse {
    pub frames: Vec<Frame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl DataResponse {
    #[must_use]
    pub fn from_frame(frame: Frame) -> Self {
        Self {
            frames: vec![frame],
            error: None,
        }
    }

    #[must_use]
    pub fn error(status: ResponseStatus, message: impl Into<String>) -> Self {
        Self {
            frames: Vec::new(),
            error: Some(ResponseError {
                status,
                message: message.into(),
            }),
        }
    }

    #[must_use]
    pub fn from_error(err: &DatasourceError) -> Self {
        Self::error(err.status(), err.to_string())
    }

    /// Attach an error to a response that keeps its frames.
    #[must_use]
    pub fn with_error(mut self, err: &DatasourceError) -> Self {
        self.error = Some(ResponseError {
            status: err.status(),
            message: err.to_string(),
        });
        self
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryDataResponse {
    pub responses: BTreeMap<String, DataResponse>,
}

impl QueryDataResponse {
    #[must_use]
    pub fn get(&self, ref_id: &str) -> Option<&DataResponse> {
        self.responses.get(ref_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckHealthResult {
    pub status: HealthStatus,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_are_bad_request() {
        let err = DatasourceError::RequestError("unmarshal query request: eof".into());
        let resp = DataResponse::from_error(&err);
        let error = resp.error.unwrap();
        assert_eq!(error.status, ResponseStatus::BadRequest);
        assert_eq!(error.status.code(), 400);
    }

    #[test]
    fn partial_results_keep_frames() {
        let resp = DataResponse::from_frame(Frame::new(""))
            .with_error(&DatasourceError::Other("stream reset".into()));
        assert_eq!(resp.frames.len(), 1);
        assert_eq!(resp.error.unwrap().status, ResponseStatus::Internal);
    }
}
