//! Messaging provider client -- concrete [`Messenger`] implementations.
//!
//! `HttpMessenger` posts to a Twilio-compatible message-create endpoint
//! (`{api_url}/Accounts/{sid}/Messages.json`) with form encoding and
//! basic auth. The auth token is wrapped in [`secrecy::SecretString`] and
//! is only exposed when building the request; it never appears in Debug
//! output or logs.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use waypost_core::transport::messenger::Messenger;
use waypost_types::config::ProviderConfig;
use waypost_types::error::MessengerError;

/// Live client for a Twilio-compatible messaging provider.
pub struct HttpMessenger {
    client: reqwest::Client,
    api_url: String,
    account_sid: String,
    auth_token: SecretString,
    from_number: String,
}

impl HttpMessenger {
    /// Create a new messenger from provider settings and the env-resolved
    /// auth token.
    pub fn new(provider: &ProviderConfig, auth_token: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_url: provider.api_url.clone(),
            account_sid: provider.account_sid.clone(),
            auth_token,
            from_number: provider.from_number.clone(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", self.api_url, self.account_sid)
    }
}

impl Messenger for HttpMessenger {
    async fn send(
        &self,
        to: &str,
        body: &str,
        media_url: Option<&str>,
    ) -> Result<(), MessengerError> {
        let mut form = vec![
            ("From", self.from_number.as_str()),
            ("To", to),
            ("Body", body),
        ];
        if let Some(url) = media_url {
            form.push(("MediaUrl", url));
        }

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&form)
            .send()
            .await
            .map_err(|e| MessengerError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MessengerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Offline stand-in: logs the outbound message instead of sending it.
pub struct FixtureMessenger;

impl Messenger for FixtureMessenger {
    async fn send(
        &self,
        to: &str,
        body: &str,
        media_url: Option<&str>,
    ) -> Result<(), MessengerError> {
        info!(to, media_url, chars = body.len(), "fixture messenger drop");
        Ok(())
    }
}

/// Construction-time selection between live and fixture messengers.
///
/// Live delivery also needs credentials: without an auth token in the
/// environment the fixture is used regardless of mode, with a warning.
pub enum AnyMessenger {
    Http(HttpMessenger),
    Fixture(FixtureMessenger),
}

impl AnyMessenger {
    /// Build a live messenger when credentials are available, else the fixture.
    pub fn from_provider(provider: &ProviderConfig, auth_token: Option<SecretString>) -> Self {
        match auth_token {
            Some(token) if !provider.account_sid.is_empty() => {
                Self::Http(HttpMessenger::new(provider, token))
            }
            _ => {
                tracing::warn!(
                    "messaging provider credentials missing, outbound messages will be logged only"
                );
                Self::Fixture(FixtureMessenger)
            }
        }
    }
}

impl Messenger for AnyMessenger {
    async fn send(
        &self,
        to: &str,
        body: &str,
        media_url: Option<&str>,
    ) -> Result<(), MessengerError> {
        match self {
            Self::Http(client) => client.send(to, body, media_url).await,
            Self::Fixture(client) => client.send(to, body, media_url).await,
        }
    }
}
