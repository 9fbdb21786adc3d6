//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and
//! REST API. The relay service is generic over its collaborator traits;
//! AppState pins it to the infra implementations selected by the
//! configured client mode.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;

use waypost_core::relay::RelayService;
use waypost_infra::config::{load_config, provider_auth_token, resolve_data_dir, webhook_secret};
use waypost_infra::http::chat::AnyChatClient;
use waypost_infra::http::messenger::AnyMessenger;
use waypost_infra::http::token::AnyTokenClient;
use waypost_infra::report::ReportStore;
use waypost_infra::sqlite::pool::DatabasePool;
use waypost_infra::sqlite::session::SqliteSessionRepository;
use waypost_types::config::WaypostConfig;

/// Concrete type alias for the relay generics pinned to infra implementations.
pub type ConcreteRelayService =
    RelayService<AnyTokenClient, AnyChatClient, SqliteSessionRepository>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<ConcreteRelayService>,
    /// Session repository for the admin surface (the relay owns its own).
    pub sessions: Arc<SqliteSessionRepository>,
    pub messenger: Arc<AnyMessenger>,
    pub reports: Arc<ReportStore>,
    pub config: Arc<WaypostConfig>,
    pub webhook_secret: Option<Arc<SecretString>>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, connect to the
    /// database, construct the mode-selected clients, wire the relay.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        // Initialize database
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("waypost.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        // Wire the relay with mode-selected clients and its own repository
        let relay = RelayService::new(
            AnyTokenClient::from_config(&config),
            AnyChatClient::from_config(&config),
            SqliteSessionRepository::new(db_pool.clone()),
        );

        let messenger = AnyMessenger::from_provider(&config.provider, provider_auth_token());
        let reports = ReportStore::new(&data_dir, &config.base_url);

        Ok(Self {
            relay: Arc::new(relay),
            sessions: Arc::new(SqliteSessionRepository::new(db_pool.clone())),
            messenger: Arc::new(messenger),
            reports: Arc::new(reports),
            config: Arc::new(config),
            webhook_secret: webhook_secret().map(Arc::new),
            data_dir,
            db_pool,
        })
    }
}
