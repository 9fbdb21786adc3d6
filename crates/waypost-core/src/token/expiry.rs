//! Local token expiry evaluation.
//!
//! Tokens issued by the authority are JWTs whose payload may carry a
//! numeric `exp` claim (seconds since epoch). The check here is purely
//! local -- base64url-decode the payload segment and read the claim; no
//! signature verification, no network.
//!
//! The policy is deliberately lopsided: a token we cannot decode, or one
//! without an `exp` claim, counts as NOT expired. The live call is the
//! real arbiter -- a dead token comes back as a 401 and the relay
//! refreshes reactively. Only a decodable claim inside the safety window
//! triggers a proactive refresh.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use tracing::warn;

/// Refresh this many seconds ahead of the actual `exp` deadline, trading
/// a few unnecessary refreshes for never knowingly sending a dead token.
pub const SAFETY_WINDOW_SECS: i64 = 60;

/// Whether the token is absent, expired, or expiring within the safety
/// window, evaluated against the current clock.
pub fn is_expired(token: Option<&str>) -> bool {
    is_expired_at(token, Utc::now())
}

/// Clock-injected form of [`is_expired`].
pub fn is_expired_at(token: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return true;
    };

    match decode_exp_claim(token) {
        Ok(Some(exp)) => exp < (now.timestamp() + SAFETY_WINDOW_SECS) as f64,
        Ok(None) => false,
        Err(reason) => {
            warn!(reason, "token expiry claim undecodable, deferring to the live call");
            false
        }
    }
}

/// Extract the `exp` claim from a JWT-shaped token without verifying it.
fn decode_exp_claim(token: &str) -> Result<Option<f64>, String> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next()) {
        (Some(_), Some(payload)) => payload,
        _ => return Err("token is not dot-delimited".to_string()),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| format!("payload segment is not base64url: {e}"))?;
    let claims: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| format!("payload segment is not JSON: {e}"))?;

    Ok(claims.get("exp").and_then(|v| v.as_f64()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build an unsigned JWT with the given payload claims.
    fn jwt_with_claims(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{header}.{payload}.sig")
    }

    #[test]
    fn absent_or_empty_token_is_expired() {
        let now = Utc::now();
        assert!(is_expired_at(None, now));
        assert!(is_expired_at(Some(""), now));
    }

    #[test]
    fn claim_inside_safety_window_is_expired() {
        let now = Utc::now();
        let token = jwt_with_claims(serde_json::json!({ "exp": now.timestamp() + 30 }));
        assert!(is_expired_at(Some(&token), now));
    }

    #[test]
    fn already_past_claim_is_expired() {
        let now = Utc::now();
        let token = jwt_with_claims(serde_json::json!({ "exp": now.timestamp() - 300 }));
        assert!(is_expired_at(Some(&token), now));
    }

    #[test]
    fn claim_beyond_safety_window_is_not_expired() {
        let now = Utc::now();
        let token = jwt_with_claims(serde_json::json!({ "exp": now.timestamp() + 3600 }));
        assert!(!is_expired_at(Some(&token), now));
    }

    #[test]
    fn window_boundary_is_not_expired() {
        let now = Utc::now();
        // exp exactly at now + 60 fails the strict `<` comparison.
        let token =
            jwt_with_claims(serde_json::json!({ "exp": now.timestamp() + SAFETY_WINDOW_SECS }));
        assert!(!is_expired_at(Some(&token), now));
    }

    #[test]
    fn missing_exp_claim_is_not_expired() {
        let token = jwt_with_claims(serde_json::json!({ "sub": "+15551234567" }));
        assert!(!is_expired_at(Some(&token), Utc::now()));
    }

    #[test]
    fn undecodable_token_is_not_expired() {
        assert!(!is_expired_at(Some("opaque-not-a-jwt"), Utc::now()));
        assert!(!is_expired_at(Some("a.%%%not-base64%%%.c"), Utc::now()));

        let not_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode(b"plain text"));
        assert!(!is_expired_at(Some(&not_json), Utc::now()));
    }

    #[test]
    fn fractional_exp_claims_are_handled() {
        let now = Utc::now();
        let token = jwt_with_claims(serde_json::json!({ "exp": (now.timestamp() + 30) as f64 + 0.5 }));
        assert!(is_expired_at(Some(&token), now));
    }
}
