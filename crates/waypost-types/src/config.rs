//! Configuration types for Waypost.
//!
//! `WaypostConfig` represents the top-level `config.toml` that wires the
//! relay to its three external services: the token authority, the AI chat
//! backend, and the messaging provider. Secrets (provider auth token,
//! webhook secret) are never stored in the file; they are resolved from
//! the environment by waypost-infra.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which client implementations to construct at startup.
///
/// `Fixture` wires deterministic in-process stand-ins for the token
/// authority and chat backend so the relay runs with no external services.
/// The selection happens once, at construction -- call sites never branch
/// on mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientMode {
    Live,
    Fixture,
}

impl Default for ClientMode {
    fn default() -> Self {
        ClientMode::Fixture
    }
}

impl fmt::Display for ClientMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMode::Live => write!(f, "live"),
            ClientMode::Fixture => write!(f, "fixture"),
        }
    }
}

impl FromStr for ClientMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" => Ok(ClientMode::Live),
            "fixture" => Ok(ClientMode::Fixture),
            other => Err(format!("invalid client mode: '{other}'")),
        }
    }
}

/// Top-level configuration for the Waypost relay.
///
/// Loaded from `{data_dir}/config.toml`. All fields have defaults; an
/// absent file yields a fixture-mode relay that works offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypostConfig {
    /// Live or fixture clients for the token authority and chat backend.
    #[serde(default)]
    pub mode: ClientMode,

    /// Token authority endpoint (POST, `{"phone_number": ...}`).
    #[serde(default)]
    pub token_url: String,

    /// AI chat backend endpoint (POST, bearer auth).
    #[serde(default)]
    pub chat_url: String,

    /// Public base URL of this relay, used to build report links.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Minutes a generated report file stays on disk before the cleanup
    /// sweep removes it.
    #[serde(default = "default_report_ttl_minutes")]
    pub report_ttl_minutes: u64,

    /// Outbound messaging provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_report_ttl_minutes() -> u64 {
    15
}

impl Default for WaypostConfig {
    fn default() -> Self {
        Self {
            mode: ClientMode::default(),
            token_url: String::new(),
            chat_url: String::new(),
            base_url: default_base_url(),
            report_ttl_minutes: default_report_ttl_minutes(),
            provider: ProviderConfig::default(),
        }
    }
}

/// Messaging provider settings (Twilio-compatible REST API).
///
/// The auth token is NOT part of this struct -- it comes from
/// `WAYPOST_PROVIDER_AUTH_TOKEN` and stays wrapped in a `SecretString`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Message-create endpoint base (e.g. "https://api.twilio.com/2010-04-01").
    #[serde(default)]
    pub api_url: String,
    /// Provider account identifier.
    #[serde(default)]
    pub account_sid: String,
    /// Sender address, e.g. "whatsapp:+14155238886".
    #[serde(default)]
    pub from_number: String,
}
