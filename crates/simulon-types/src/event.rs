//! Event types for the Simulon loop event bus.
//!
//! `LoopEvent` is what the conversation loop reports about itself. All
//! variants are Clone + Send + Sync for use with tokio broadcast channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::SessionId;

/// Events emitted while a conversation loop runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoopEvent {
    /// A loop accepted its seed and is about to call the model.
    LoopStarted {
        run_id: Uuid,
        session_id: Option<SessionId>,
        max_rounds: u32,
        at: DateTime<Utc>,
    },

    /// A persona line was derived (round 0 is the seed persona).
    PersonaDerived {
        run_id: Uuid,
        round: u32,
        persona: String,
        at: DateTime<Utc>,
    },

    /// A question/answer pair was produced and handed to the sink.
    PairProduced {
        run_id: Uuid,
        round: u32,
        at: DateTime<Utc>,
    },

    /// All rounds completed.
    LoopFinished {
        run_id: Uuid,
        pairs: u32,
        duration_ms: u64,
        at: DateTime<Utc>,
    },

    /// A remote call failed; no further rounds will run.
    LoopFailed {
        run_id: Uuid,
        round: u32,
        error: String,
        at: DateTime<Utc>,
    },
}

impl LoopEvent {
    pub fn run_id(&self) -> Uuid {
        match self {
            LoopEvent::LoopStarted { run_id, .. }
            | LoopEvent::PersonaDerived { run_id, .. }
            | LoopEvent::PairProduced { run_id, .. }
            | LoopEvent::LoopFinished { run_id, .. }
            | LoopEvent::LoopFailed { run_id, .. } => *run_id,
        }
    }
}
