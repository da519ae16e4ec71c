//! State of one client shell.
//!
//! The session id is generated once when the shell starts and sent with
//! every request. A submission clears prior pairs and marks the shell as
//! loading; the loading flag is cleared exactly once per submission, by
//! either [`ShellState::finish`] or [`ShellState::fail`].

use simulon_types::session::SessionId;
use simulon_types::think::QaPair;

#[derive(Debug, Clone)]
pub struct ShellState {
    query: String,
    pairs: Vec<QaPair>,
    loading: bool,
    session_id: SessionId,
}

impl ShellState {
    pub fn new() -> Self {
        Self::with_session(SessionId::generate())
    }

    pub fn with_session(session_id: SessionId) -> Self {
        Self {
            query: String::new(),
            pairs: Vec::new(),
            loading: false,
            session_id,
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn pairs(&self) -> &[QaPair] {
        &self.pairs
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Start a submission. Returns the seed to send, or `None` for a blank
    /// query, in which case nothing changes.
    pub fn submit(&mut self) -> Option<String> {
        let seed = self.query.trim();
        if seed.is_empty() {
            return None;
        }
        let seed = seed.to_string();
        self.pairs.clear();
        self.loading = true;
        Some(seed)
    }

    /// Progressive and stream modes: one more pair arrived.
    pub fn push_pair(&mut self, pair: QaPair) {
        self.pairs.push(pair);
    }

    /// Batch mode: the whole result arrived at once.
    pub fn replace_pairs(&mut self, pairs: Vec<QaPair>) {
        self.pairs = pairs;
    }

    /// The submission ended normally. Returns whether this call cleared the
    /// loading flag.
    pub fn finish(&mut self) -> bool {
        std::mem::replace(&mut self.loading, false)
    }

    /// The submission failed in transport: show the placeholder pair only.
    /// Returns whether this call cleared the loading flag.
    pub fn fail(&mut self) -> bool {
        self.pairs = vec![QaPair::failure_placeholder()];
        self.finish()
    }
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new()
    }
}
