//! Session store implementations.

pub mod memory;

pub use memory::{InMemorySessionStore, spawn_expiry_sweeper};
