//! Terminal client shell.
//!
//! - `state`: query, pairs, loading flag and session id of one shell
//! - `client`: HTTP client for the three delivery modes
//! - `renderer`: spinner and pair output

pub mod client;
pub mod renderer;
pub mod state;
