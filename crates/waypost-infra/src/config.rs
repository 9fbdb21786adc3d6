//! Configuration loading for Waypost.
//!
//! Reads `config.toml` from the data directory (`~/.waypost/` in
//! production) and deserializes it into [`WaypostConfig`]. Falls back to
//! defaults when the file is missing or malformed. Secrets never live in
//! the file; they are resolved from the environment here and wrapped in
//! [`secrecy::SecretString`].

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use waypost_types::config::WaypostConfig;

/// Environment variable holding the messaging-provider auth token.
pub const PROVIDER_AUTH_TOKEN_VAR: &str = "WAYPOST_PROVIDER_AUTH_TOKEN";

/// Environment variable holding the inbound-webhook HMAC secret.
pub const WEBHOOK_SECRET_VAR: &str = "WAYPOST_WEBHOOK_SECRET";

/// Resolve the data directory: `WAYPOST_DATA_DIR`, else `~/.waypost`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("WAYPOST_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".waypost");
    }

    // Last resort: current directory
    PathBuf::from(".waypost")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`WaypostConfig::default()`]
///   (fixture mode, no external services).
/// - If the file exists but fails to parse, logs a warning and returns
///   the default.
pub async fn load_config(data_dir: &Path) -> WaypostConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return WaypostConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return WaypostConfig::default();
        }
    };

    match toml::from_str::<WaypostConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            WaypostConfig::default()
        }
    }
}

/// Messaging-provider auth token from the environment, if set.
pub fn provider_auth_token() -> Option<SecretString> {
    std::env::var(PROVIDER_AUTH_TOKEN_VAR)
        .ok()
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}

/// Inbound-webhook HMAC secret from the environment, if set.
pub fn webhook_secret() -> Option<SecretString> {
    std::env::var(WEBHOOK_SECRET_VAR)
        .ok()
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use waypost_types::config::ClientMode;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.mode, ClientMode::Fixture);
        assert!(config.token_url.is_empty());
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
mode = "live"
token_url = "https://auth.example.com/token"
chat_url = "https://ai.example.com/chat"

[provider]
account_sid = "AC42"
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.mode, ClientMode::Live);
        assert_eq!(config.chat_url, "https://ai.example.com/chat");
        assert_eq!(config.provider.account_sid, "AC42");
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.mode, ClientMode::Fixture);
    }
}
