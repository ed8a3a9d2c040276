//! Mapping from pipeline failures to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use sleepwatch_core::PipelineError;
use thiserror::Error;
use tracing::error;

/// Errors a handler can answer with. Bodies are `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The pipeline rejected or failed the frame.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The multipart request is malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The outcome store could not be read.
    #[error("Failed to fetch analytics data")]
    Analytics(#[source] anyhow::Error),

    /// Inference did not finish within the request timeout.
    #[error("Prediction timed out")]
    Timeout,

    /// The blocking task panicked or was cancelled.
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Pipeline(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            Self::Pipeline(_) | Self::Analytics(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Analytics(e) | Self::Internal(e) => error!("{self}: {e:#}"),
            Self::Pipeline(e) if status.is_server_error() => error!("Prediction failed: {e}"),
            _ => {}
        }
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
