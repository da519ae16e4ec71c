//! The think endpoint.
//!
//! POST /api/think?mode=batch|progressive|stream|single
//!
//! The loop always runs on its own task and writes frames into a channel;
//! each mode only differs in how it drains that channel:
//! - `batch`: waits for the terminal frame, answers `{"results":[...]}`
//! - `progressive`: chunked `application/json`, one chunk per frame
//! - `stream`: Server-Sent Events, `data: <pair>` frames, then `data: [DONE]`
//! - `single`: one model call on the session context, `{"result": "..."}`

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tokio::sync::mpsc;

use simulon_core::delivery::batch::collect_batch;
use simulon_core::delivery::frame_channel;
use simulon_core::delivery::progressive::ProgressiveJsonEncoder;
use simulon_core::think::{ThinkJob, TurnJob, validate_seed};
use simulon_types::error::ThinkError;
use simulon_types::llm::Message;
use simulon_types::session::SessionId;
use simulon_types::think::{GENERIC_FAILURE, SSE_DONE, ThinkFrame, ThinkMode, TurnReply};

use crate::http::error::AppError;
use crate::state::AppState;

/// Request body of `POST /api/think`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkRequest {
    pub query: Option<String>,
    /// Older clients send the seed under this name.
    pub root_query: Option<String>,
    pub session_id: Option<String>,
    /// Replaces the stored history of the session.
    pub messages: Option<Vec<Message>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThinkParams {
    pub mode: Option<String>,
}

/// POST /api/think
pub async fn think(
    State(state): State<AppState>,
    Query(params): Query<ThinkParams>,
    body: Result<Json<ThinkRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let mode = match params.mode.as_deref() {
        Some(m) => m.parse::<ThinkMode>().map_err(AppError::Validation)?,
        None => state.default_mode,
    };
    let session_id = body
        .session_id
        .as_deref()
        .map(str::parse::<SessionId>)
        .transpose()
        .map_err(ThinkError::InvalidSession)?;
    let query = body.query.or(body.root_query);

    if mode == ThinkMode::Single {
        let result = state
            .think
            .single_turn(TurnJob {
                session_id,
                query,
                messages: body.messages,
            })
            .await?;
        return Ok(Json(TurnReply { result }).into_response());
    }

    let seed = validate_seed(query.as_deref().unwrap_or_default())?.to_string();
    let job = ThinkJob {
        seed,
        session_id,
        history_override: body.messages.filter(|m| !m.is_empty()),
        paced: mode.is_incremental(),
    };
    tracing::debug!(%mode, session = ?job.session_id, "think request accepted");

    let rx = spawn_loop(&state, job);
    Ok(match mode {
        ThinkMode::Batch => batch_response(rx).await?,
        ThinkMode::Progressive => progressive_response(rx),
        _ => stream_response(rx).into_response(),
    })
}

/// Run the loop detached from the request so a disconnect does not stop it.
fn spawn_loop(state: &AppState, job: ThinkJob) -> mpsc::Receiver<ThinkFrame> {
    let (mut tx, rx) = frame_channel(state.think.settings().max_rounds);
    let service = state.think.clone();
    tokio::spawn(async move {
        // Failures are logged and framed by the loop itself.
        let _ = service.run_loop(job, &mut tx).await;
    });
    rx
}

async fn batch_response(mut rx: mpsc::Receiver<ThinkFrame>) -> Result<Response, AppError> {
    let batch = collect_batch(&mut rx).await.map_err(AppError::Internal)?;
    Ok(Json(batch).into_response())
}

fn progressive_response(mut rx: mpsc::Receiver<ThinkFrame>) -> Response {
    let body = async_stream::stream! {
        let mut encoder = ProgressiveJsonEncoder::new();
        yield Ok::<_, Infallible>(Bytes::from_static(encoder.opening().as_bytes()));

        while let Some(frame) = rx.recv().await {
            let chunk = encoder.encode(&frame);
            if !chunk.is_empty() {
                yield Ok(Bytes::from(chunk));
            }
            if frame.is_terminal() {
                break;
            }
        }

        // Loop task vanished without a terminal frame.
        if !encoder.is_closed() {
            let reason = GENERIC_FAILURE.to_string();
            yield Ok(Bytes::from(encoder.encode(&ThinkFrame::Error { reason })));
        }
    };

    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

fn stream_response(
    mut rx: mpsc::Receiver<ThinkFrame>,
) -> Sse<impl futures_util::Stream<Item = Result<Event, Infallible>>> {
    let events = async_stream::stream! {
        let mut terminated = false;
        while let Some(frame) = rx.recv().await {
            yield Ok::<_, Infallible>(Event::default().data(frame.to_sse_data()));
            match frame {
                ThinkFrame::Data(_) => {}
                ThinkFrame::Done => {
                    terminated = true;
                    break;
                }
                ThinkFrame::Error { .. } => {
                    yield Ok(Event::default().data(SSE_DONE));
                    terminated = true;
                    break;
                }
            }
        }

        if !terminated {
            let reason = GENERIC_FAILURE.to_string();
            yield Ok(Event::default().data(ThinkFrame::Error { reason }.to_sse_data()));
            yield Ok(Event::default().data(SSE_DONE));
        }
    };

    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
