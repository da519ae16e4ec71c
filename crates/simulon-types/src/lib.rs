//! Shared domain types for Simulon.
//!
//! This crate contains the types passed between the conversation loop, the
//! delivery channel, and the client shell: messages, question/answer pairs,
//! stream frames, sessions, loop events, configuration, and error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod llm;
pub mod session;
pub mod think;
