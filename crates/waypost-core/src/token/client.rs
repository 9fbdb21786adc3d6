//! TokenClient trait definition.

use waypost_types::error::TokenError;

/// Client for the external token authority.
///
/// One operation: exchange a user identity for a fresh opaque bearer
/// token. Implementations live in waypost-infra (`HttpTokenClient`,
/// `FixtureTokenClient`). Uses native async fn in traits (RPITIT,
/// Rust 2024 edition).
///
/// The client performs a single round trip and never retries; retry
/// policy belongs to the relay orchestrator.
pub trait TokenClient: Send + Sync {
    /// Fetch a fresh access token for the given identity.
    fn fetch_token(
        &self,
        identity: &str,
    ) -> impl std::future::Future<Output = Result<String, TokenError>> + Send;
}
