//! Infrastructure layer for Simulon.
//!
//! Contains implementations of the port traits defined in `simulon-core`:
//! the OpenAI-compatible chat provider and the in-memory session store, plus
//! the configuration loader.

pub mod config;
pub mod llm;
pub mod session;
