//! SessionRepository trait definition.

use waypost_types::error::RepositoryError;
use waypost_types::session::UserSession;

/// Repository trait for per-identity session persistence.
///
/// Implementations live in waypost-infra (e.g. `SqliteSessionRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
///
/// `find_by_identity` and `upsert` are the two operations the relay
/// orchestrator needs; both are individually atomic at the store level.
/// Concurrent writes for the same identity are last-writer-wins by
/// design. The remaining operations serve the CLI and admin API.
pub trait SessionRepository: Send + Sync {
    /// Look up the session for an identity, if one exists.
    fn find_by_identity(
        &self,
        identity: &str,
    ) -> impl std::future::Future<Output = Result<Option<UserSession>, RepositoryError>> + Send;

    /// Insert or fully replace the session keyed by its identity.
    fn upsert(
        &self,
        session: &UserSession,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List sessions, most recently updated first.
    fn list(
        &self,
        limit: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<UserSession>, RepositoryError>> + Send;

    /// Delete the session for an identity.
    ///
    /// Returns `RepositoryError::NotFound` if no session exists.
    fn delete_by_identity(
        &self,
        identity: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Count stored sessions.
    fn count(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
