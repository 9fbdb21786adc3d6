//! Messenger trait definition.

use waypost_types::error::MessengerError;

/// Outbound client for the messaging provider.
///
/// Sends one message to a user, optionally with a media attachment the
/// provider fetches by URL. Implementations live in waypost-infra
/// (`HttpMessenger`, `FixtureMessenger`). Uses native async fn in traits
/// (RPITIT, Rust 2024 edition).
pub trait Messenger: Send + Sync {
    /// Send `body` to the given address (e.g. "whatsapp:+15551234567").
    fn send(
        &self,
        to: &str,
        body: &str,
        media_url: Option<&str>,
    ) -> impl std::future::Future<Output = Result<(), MessengerError>> + Send;
}
