//! Session storage port.
//!
//! The conversation loop reads and extends per-session message histories
//! through the `SessionStore` trait; implementations live in simulon-infra.

pub mod store;

pub use store::SessionStore;
