//! HTTP mapping of pipeline errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cp_batch_ingest::IngestError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Error surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request itself is malformed (bad multipart, bad JSON, missing
    /// fields).
    #[error("{0}")]
    BadRequest(String),

    /// The batch was understood but rejected by ingestion rules.
    #[error(transparent)]
    Rejected(IngestError),

    /// Service-side failure.
    #[error("{0}")]
    Internal(String),
}

impl From<IngestError> for ApiError {
    fn from(error: IngestError) -> Self {
        if error.is_client_fault() {
            Self::Rejected(error)
        } else {
            Self::Internal(error.to_string())
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(error: axum::extract::multipart::MultipartError) -> Self {
        Self::BadRequest(format!("malformed multipart body: {error}"))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(%self, "request failed");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
