use thiserror::Error;

/// Errors from the external token authority.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token authority returned no usable token")]
    MissingToken,

    #[error("token authority returned status {0}")]
    Status(u16),

    #[error("token authority request failed: {0}")]
    Transport(String),
}

/// Classified failures from the AI chat backend.
///
/// The relay's retry policy branches on these variants; see
/// `waypost-core::relay`. `Unavailable` covers everything the relay will
/// not retry: timeouts, malformed bodies, unexpected statuses.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat backend rejected the access token")]
    Unauthenticated,

    #[error("chat backend rejected the conversation id")]
    InvalidConversation,

    #[error("chat backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors from repository operations (used by trait definitions in waypost-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Terminal outcome of one relayed message.
///
/// `AiServiceUnavailable` is raised only after the one-shot reactive
/// refresh-and-retry cycle fails; every other variant carries the
/// underlying failure unchanged.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("authentication provider error: {0}")]
    AuthProvider(#[from] TokenError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("AI service unavailable")]
    AiServiceUnavailable,

    #[error("session store error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors from the outbound messaging provider.
#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("message provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("message provider request failed: {0}")]
    Transport(String),
}

/// Errors from report materialization.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report table has no rows or headers")]
    EmptyTable,

    #[error("report write failed: {0}")]
    Io(#[from] std::io::Error),
}
