//! Inbound webhook signature verification.
//!
//! Deployments that configure a webhook secret require every inbound
//! request to carry an HMAC-SHA256 signature over the raw body. The
//! comparison is constant-time via the hmac crate's `verify_slice`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur during webhook signature verification.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// HMAC signature verification failed.
    #[error("HMAC signature verification failed")]
    VerificationFailed,

    /// Invalid HMAC key.
    #[error("invalid HMAC key: {0}")]
    InvalidKey(String),
}

/// Verify an HMAC-SHA256 signature against a raw request body.
///
/// Accepts both plain hex signatures and the `sha256=<hex>` form some
/// providers send.
pub fn verify_signature(secret: &[u8], body: &[u8], signature: &str) -> Result<(), WebhookError> {
    let hex_sig = signature.strip_prefix("sha256=").unwrap_or(signature);

    let expected_bytes = hex_decode(hex_sig).map_err(|_| WebhookError::VerificationFailed)?;

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| WebhookError::InvalidKey(e.to_string()))?;
    mac.update(body);

    mac.verify_slice(&expected_bytes)
        .map_err(|_| WebhookError::VerificationFailed)
}

/// Decode a hex string into bytes.
fn hex_decode(hex: &str) -> Result<Vec<u8>, ()> {
    if !hex.is_ascii() || hex.len() % 2 != 0 {
        return Err(());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &[u8], body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(body);
        mac.finalize()
            .into_bytes()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    #[test]
    fn valid_signature_verifies() {
        let secret = b"topsecret";
        let body = b"From=%2B1555&Body=hello";
        let sig = sign(secret, body);

        assert!(verify_signature(secret, body, &sig).is_ok());
        assert!(verify_signature(secret, body, &format!("sha256={sig}")).is_ok());
    }

    #[test]
    fn tampered_body_fails() {
        let secret = b"topsecret";
        let sig = sign(secret, b"From=%2B1555&Body=hello");

        assert!(matches!(
            verify_signature(secret, b"From=%2B1555&Body=hacked", &sig),
            Err(WebhookError::VerificationFailed)
        ));
    }

    #[test]
    fn malformed_hex_fails() {
        assert!(verify_signature(b"secret", b"body", "not-hex").is_err());
        assert!(verify_signature(b"secret", b"body", "abc").is_err());
    }
}
