//! AiChatClient trait definition.

use waypost_types::answer::AiAnswer;
use waypost_types::error::ChatError;

/// Client for the external conversational AI backend.
///
/// Sends one question with optional conversation context and returns the
/// structured answer, or a classified failure the relay's retry policy
/// branches on. Implementations live in waypost-infra (`HttpChatClient`,
/// `FixtureChatClient`). Uses native async fn in traits (RPITIT,
/// Rust 2024 edition).
///
/// The request payload is identity-free: the bearer token is the only
/// credential, and `conversation_id = None` asks the backend to open a
/// fresh dialogue. A returned conversation id is passed through
/// uninterpreted -- storing it is the orchestrator's job.
pub trait AiChatClient: Send + Sync {
    /// Ask one question under the given token and conversation context.
    fn ask(
        &self,
        token: &str,
        conversation_id: Option<&str>,
        question: &str,
    ) -> impl std::future::Future<Output = Result<AiAnswer, ChatError>> + Send;
}
