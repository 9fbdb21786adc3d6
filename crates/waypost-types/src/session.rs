//! Per-identity relay session state.
//!
//! A [`UserSession`] is Waypost's persisted record for one user: the access
//! token used against the AI backend, the conversation id that keeps
//! dialogue context across messages, and refresh bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted session state for one user identity.
///
/// Exactly one session exists per identity (the phone number in E.164
/// form); lookups and upserts are keyed by it. Sessions are created lazily
/// on first contact and never deleted by the relay itself -- deletion is an
/// administrative action through the CLI or API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    /// Stable external identifier for the user (e.g. "+15551234567").
    pub identity: String,
    /// Opaque bearer credential for the AI backend. Never the empty
    /// string: either a usable token or `None` before the first successful
    /// authentication.
    pub access_token: Option<String>,
    /// Opaque dialogue handle owned by the AI backend. `None` asks the
    /// backend to start a fresh conversation. The relay only ever stores
    /// ids the backend supplied; it never invents one.
    pub conversation_id: Option<String>,
    /// When the token was last acquired. Advisory only -- expiry decisions
    /// read the token itself, not this timestamp.
    pub token_refreshed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSession {
    /// Build a freshly provisioned session for a first-contact identity.
    pub fn provisioned(identity: impl Into<String>, access_token: String, now: DateTime<Utc>) -> Self {
        Self {
            identity: identity.into(),
            access_token: Some(access_token),
            conversation_id: None,
            token_refreshed_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }
}
