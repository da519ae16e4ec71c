//! Session inspection handlers.
//!
//! Endpoints:
//! - GET    /api/sessions/{id} - Stored message history of a session
//! - DELETE /api/sessions/{id} - Drop a session (idempotent)

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;

use simulon_types::error::ThinkError;
use simulon_types::llm::Message;
use simulon_types::session::SessionId;

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHistory {
    pub session_id: SessionId,
    pub messages: Vec<Message>,
}

fn parse_id(raw: &str) -> Result<SessionId, AppError> {
    Ok(raw.parse::<SessionId>().map_err(ThinkError::InvalidSession)?)
}

/// GET /api/sessions/{id}
///
/// Unknown and expired sessions answer with an empty history.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionHistory>, AppError> {
    let session_id = parse_id(&id)?;
    let messages = state.think.history(&session_id).await;
    Ok(Json(SessionHistory {
        session_id,
        messages,
    }))
}

/// DELETE /api/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let session_id = parse_id(&id)?;
    let existed = state.think.forget(&session_id).await;
    tracing::debug!(session = %session_id, existed, "session deleted");
    Ok(StatusCode::NO_CONTENT)
}
