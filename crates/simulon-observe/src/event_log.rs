//! Forwards loop events from the event bus into `tracing`.
//!
//! The conversation loop publishes [`LoopEvent`]s on a broadcast channel; a
//! single forwarder task turns each into one structured log record. Persona
//! text stays out of the log, only its length is recorded.

use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use simulon_types::event::LoopEvent;

/// Stable name of an event kind, matching its serialized `type` tag.
pub fn event_name(event: &LoopEvent) -> &'static str {
    match event {
        LoopEvent::LoopStarted { .. } => "loop_started",
        LoopEvent::PersonaDerived { .. } => "persona_derived",
        LoopEvent::PairProduced { .. } => "pair_produced",
        LoopEvent::LoopFinished { .. } => "loop_finished",
        LoopEvent::LoopFailed { .. } => "loop_failed",
    }
}

/// Emit one tracing record for `event`.
pub fn log_event(event: &LoopEvent) {
    let kind = event_name(event);
    match event {
        LoopEvent::LoopStarted {
            run_id,
            session_id,
            max_rounds,
            ..
        } => {
            let session = session_id.as_ref().map(|s| s.as_str()).unwrap_or("-");
            info!(event = kind, %run_id, session, max_rounds, "loop started");
        }
        LoopEvent::PersonaDerived {
            run_id,
            round,
            persona,
            ..
        } => {
            debug!(event = kind, %run_id, round, persona_chars = persona.chars().count(), "persona derived");
        }
        LoopEvent::PairProduced { run_id, round, .. } => {
            debug!(event = kind, %run_id, round, "pair produced");
        }
        LoopEvent::LoopFinished {
            run_id,
            pairs,
            duration_ms,
            ..
        } => {
            info!(event = kind, %run_id, pairs, duration_ms, "loop finished");
        }
        LoopEvent::LoopFailed {
            run_id,
            round,
            error,
            ..
        } => {
            error!(event = kind, %run_id, round, error = %error, "loop failed");
        }
    }
}

/// Spawn the forwarder. It ends when every sender of the bus is gone.
pub fn spawn_event_logger(mut rx: Receiver<LoopEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event logger lagged, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("event logger stopped");
    })
}
