//! Token authority client -- concrete [`TokenClient`] implementations.
//!
//! `HttpTokenClient` performs the single POST round trip to the external
//! token authority. `FixtureTokenClient` mints deterministic offline
//! tokens for development and tests. `AnyTokenClient` selects between
//! them at construction time.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use waypost_core::token::client::TokenClient;
use waypost_types::config::{ClientMode, WaypostConfig};
use waypost_types::error::TokenError;

/// Live client for the external token authority.
pub struct HttpTokenClient {
    client: reqwest::Client,
    token_url: String,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    phone_number: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

impl HttpTokenClient {
    /// Create a new client pointed at the given token endpoint.
    pub fn new(token_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create reqwest client");

        Self { client, token_url }
    }
}

impl TokenClient for HttpTokenClient {
    async fn fetch_token(&self, identity: &str) -> Result<String, TokenError> {
        let response = self
            .client
            .post(&self.token_url)
            .json(&TokenRequest {
                phone_number: identity,
            })
            .send()
            .await
            .map_err(|e| TokenError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TokenError::Status(status.as_u16()));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| TokenError::Transport(format!("malformed response: {e}")))?;

        match body.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(TokenError::MissingToken),
        }
    }
}

/// Offline stand-in: mints an opaque per-identity token.
///
/// The token carries no expiry claim, so the expiry evaluator treats it
/// as valid indefinitely -- fixture runs never hit the refresh paths
/// unless a test forces them to.
pub struct FixtureTokenClient;

impl TokenClient for FixtureTokenClient {
    async fn fetch_token(&self, identity: &str) -> Result<String, TokenError> {
        Ok(format!("wp_fixture_{}", identity.trim_start_matches('+')))
    }
}

/// Construction-time selection between live and fixture token clients.
pub enum AnyTokenClient {
    Http(HttpTokenClient),
    Fixture(FixtureTokenClient),
}

impl AnyTokenClient {
    /// Build the client matching the configured mode.
    pub fn from_config(config: &WaypostConfig) -> Self {
        match config.mode {
            ClientMode::Live => Self::Http(HttpTokenClient::new(config.token_url.clone())),
            ClientMode::Fixture => Self::Fixture(FixtureTokenClient),
        }
    }
}

impl TokenClient for AnyTokenClient {
    async fn fetch_token(&self, identity: &str) -> Result<String, TokenError> {
        match self {
            Self::Http(client) => client.fetch_token(identity).await,
            Self::Fixture(client) => client.fetch_token(identity).await,
        }
    }
}
