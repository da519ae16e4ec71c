use thiserror::Error;

use crate::llm::LlmError;

/// Errors from a think request (loop or single turn).
#[derive(Debug, Error)]
pub enum ThinkError {
    #[error("missing query")]
    EmptyQuery,

    #[error("invalid session id: {0}")]
    InvalidSession(String),

    #[error("remote model call failed: {0}")]
    Remote(#[from] LlmError),
}

impl ThinkError {
    /// Whether the caller is at fault (HTTP 4xx) rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ThinkError::EmptyQuery | ThinkError::InvalidSession(_))
    }
}

/// Errors from repository operations (used by trait definitions in simulon-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),
}
