//! In-memory session store with idle expiry.
//!
//! Histories live in a `DashMap` keyed by session id. Every read or write
//! touches the entry; an entry idle for longer than the TTL is treated as
//! absent and removed by the next sweep (or the next access, whichever
//! comes first). Nothing survives a restart.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use simulon_core::session::SessionStore;
use simulon_types::error::RepositoryError;
use simulon_types::llm::Message;
use simulon_types::session::SessionId;

#[derive(Debug)]
struct Entry {
    messages: Vec<Message>,
    touched: Instant,
}

/// Process-local [`SessionStore`]. Cheap to clone; clones share storage.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    entries: Arc<DashMap<SessionId, Entry>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of sessions currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.duration_since(entry.touched) > self.ttl
    }
}

impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Vec<Message>, RepositoryError> {
        let now = Instant::now();
        if let Some(mut entry) = self.entries.get_mut(id) {
            if !self.is_expired(&entry, now) {
                entry.touched = now;
                return Ok(entry.messages.clone());
            }
        } else {
            return Ok(Vec::new());
        }
        self.entries.remove(id);
        debug!(session = %id, "dropped expired session on access");
        Ok(Vec::new())
    }

    async fn append(&self, id: &SessionId, messages: &[Message]) -> Result<(), RepositoryError> {
        let now = Instant::now();
        let mut entry = self.entries.entry(id.clone()).or_insert_with(|| Entry {
            messages: Vec::new(),
            touched: now,
        });
        if self.is_expired(&entry, now) {
            entry.messages.clear();
        }
        entry.messages.extend_from_slice(messages);
        entry.touched = now;
        Ok(())
    }

    async fn replace(&self, id: &SessionId, messages: Vec<Message>) -> Result<(), RepositoryError> {
        self.entries.insert(
            id.clone(),
            Entry {
                messages,
                touched: Instant::now(),
            },
        );
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> Result<bool, RepositoryError> {
        Ok(self.entries.remove(id).is_some())
    }

    async fn purge_expired(&self) -> Result<usize, RepositoryError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !self.is_expired(entry, now));
        Ok(before.saturating_sub(self.entries.len()))
    }
}

/// Spawn a task purging expired sessions every `every` until `cancel` fires.
pub fn spawn_expiry_sweeper<S>(store: S, every: Duration, cancel: CancellationToken) -> JoinHandle<()>
where
    S: SessionStore + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = every.as_secs(), "session expiry sweeper started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => match store.purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => debug!(purged, "purged expired sessions"),
                    Err(e) => warn!(error = %e, "session sweep failed"),
                },
            }
        }

        info!("session expiry sweeper stopped");
    })
}
