//! HTTP layer for Simulon.
//!
//! Axum-based API: the think endpoint in its four delivery modes, session
//! inspection, a health probe, and the embedded browser shell at `/`.

pub mod error;
pub mod handlers;
pub mod router;
