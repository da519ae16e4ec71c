//! HTTP request handlers.

pub mod session;
pub mod system;
pub mod think;
