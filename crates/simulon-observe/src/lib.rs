//! Observability for Simulon: subscriber setup and the loop event forwarder.

pub mod event_log;
pub mod tracing_setup;
