//! Session store trait.

use simulon_types::error::RepositoryError;
use simulon_types::llm::Message;
use simulon_types::session::SessionId;

/// Keyed storage of ordered message histories with an expiry policy.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in simulon-infra.
pub trait SessionStore: Send + Sync {
    /// Full history of a session, oldest first. Unknown or expired sessions
    /// yield an empty history.
    fn load(
        &self,
        id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Append messages in order, creating the session if it does not exist.
    fn append(
        &self,
        id: &SessionId,
        messages: &[Message],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Replace the whole history of a session.
    fn replace(
        &self,
        id: &SessionId,
        messages: Vec<Message>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Drop a session. Returns whether it existed.
    fn remove(
        &self,
        id: &SessionId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Drop every session whose time-to-live has elapsed. Returns the count.
    fn purge_expired(
        &self,
    ) -> impl std::future::Future<Output = Result<usize, RepositoryError>> + Send;
}
