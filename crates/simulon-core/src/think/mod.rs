//! The conversation loop.
//!
//! - `prompt`: wording of every model call
//! - `engine`: instrumented, single-attempt model calls
//! - `service`: the loop itself plus the single-turn session call

pub mod engine;
pub mod prompt;
pub mod service;

pub use engine::ThinkEngine;
pub use service::{ThinkJob, ThinkService, TurnJob, validate_seed};
