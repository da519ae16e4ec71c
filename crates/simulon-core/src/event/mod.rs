//! Event bus for conversation-loop events.
//!
//! Provides an `EventBus` that distributes `LoopEvent` messages to all
//! subscribers via a `tokio::sync::broadcast` channel.

pub mod bus;

pub use bus::EventBus;
