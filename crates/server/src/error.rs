// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Model not loaded")]
    ServiceUnavailable,

    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    #[error("Stem '{stem}' not found for job {job_id}")]
    StemNotFound { job_id: Uuid, stem: String },

    #[error("Stem file missing from storage: {path}")]
    StemFileMissing { path: String },

    #[error("Job not completed: {status}")]
    NotReady { status: String },

    #[error("Failed to store upload: {0}")]
    Staging(#[source] std::io::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::ServiceUnavailable => {
                tracing::warn!("Submission rejected: model not loaded");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::new("Model not loaded"),
                )
            }
            ApiError::JobNotFound(id) => {
                tracing::warn!(job_id = %id, "Job not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("Job not found", format!("Job ID: {id}")),
                )
            }
            ApiError::StemNotFound { job_id, stem } => {
                tracing::warn!(job_id = %job_id, stem = %stem, "Stem not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("Stem not found", format!("Stem: {stem}")),
                )
            }
            ApiError::StemFileMissing { path } => {
                tracing::error!(path = %path, "Stem file missing from storage");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new("Stem file not found"),
                )
            }
            ApiError::NotReady { status } => {
                tracing::warn!(status = %status, "Download before completion");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Job not completed", status.clone()),
                )
            }
            ApiError::Staging(source) => {
                tracing::error!(error = %source, "Failed to stage uploaded file");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Failed to save file", source.to_string()),
                )
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad request", msg.clone()),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
