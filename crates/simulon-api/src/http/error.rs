//! Application error type mapping to HTTP status codes.
//!
//! Every error body has the shape `{"error": "<message>"}`. Client input
//! errors carry their own message; everything else is reported with the
//! generic failure text and logged server-side.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use simulon_types::error::ThinkError;
use simulon_types::think::GENERIC_FAILURE;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors from the conversation loop or single turn.
    Think(ThinkError),
    /// Malformed request (bad JSON, unknown mode, invalid session id).
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ThinkError> for AppError {
    fn from(e: ThinkError) -> Self {
        AppError::Think(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Think(e) if e.is_client_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Think(e) => {
                tracing::error!(error = %e, "think request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
