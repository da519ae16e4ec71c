//! Business logic and port traits for Simulon.
//!
//! This crate defines the "ports" (provider and session-store traits) that
//! the infrastructure layer implements, plus the conversation loop and the
//! delivery strategies. It depends only on `simulon-types` -- never on
//! `simulon-infra` or any HTTP/IO crate.

pub mod delivery;
pub mod event;
pub mod llm;
pub mod session;
pub mod think;
