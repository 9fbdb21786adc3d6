//! AI chat backend client -- concrete [`AiChatClient`] implementations.
//!
//! `HttpChatClient` posts one question with bearer auth and classifies
//! failures into the variants the relay's retry policy branches on:
//! HTTP 401 -> `Unauthenticated`, backend error code
//! `INVALID_CONVERSATION_ID` -> `InvalidConversation`, everything else ->
//! `Unavailable`. `FixtureChatClient` echoes a canned structured answer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use waypost_core::chat::client::AiChatClient;
use waypost_types::answer::{AiAnswer, AnswerBlock, AnswerBody, Metric};
use waypost_types::config::{ClientMode, WaypostConfig};
use waypost_types::error::ChatError;

/// Backend error code signaling an unrecognized conversation id.
const INVALID_CONVERSATION_CODE: &str = "INVALID_CONVERSATION_ID";

/// Live client for the AI chat backend.
pub struct HttpChatClient {
    client: reqwest::Client,
    chat_url: String,
}

#[derive(Serialize)]
struct AskRequest<'a> {
    conversation_id: Option<&'a str>,
    question: &'a str,
    enable_cache: bool,
}

#[derive(Deserialize)]
struct BackendErrorBody {
    #[serde(default)]
    error: Option<String>,
}

impl HttpChatClient {
    /// Create a new client pointed at the given chat endpoint.
    pub fn new(chat_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to create reqwest client");

        Self { client, chat_url }
    }
}

impl AiChatClient for HttpChatClient {
    async fn ask(
        &self,
        token: &str,
        conversation_id: Option<&str>,
        question: &str,
    ) -> Result<AiAnswer, ChatError> {
        let response = self
            .client
            .post(&self.chat_url)
            .bearer_auth(token)
            .json(&AskRequest {
                conversation_id,
                question,
                enable_cache: true,
            })
            .send()
            .await
            .map_err(|e| ChatError::Unavailable(format!("transport: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ChatError::Unauthenticated);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(parsed) = serde_json::from_str::<BackendErrorBody>(&body)
                && parsed.error.as_deref() == Some(INVALID_CONVERSATION_CODE)
            {
                return Err(ChatError::InvalidConversation);
            }
            return Err(ChatError::Unavailable(format!("HTTP {status}: {body}")));
        }

        response
            .json::<AiAnswer>()
            .await
            .map_err(|e| ChatError::Unavailable(format!("malformed response body: {e}")))
    }
}

/// Offline stand-in: answers every question with a canned payload.
///
/// Keeps a stable conversation id so the orchestrator's id-propagation
/// path runs end to end in fixture mode.
pub struct FixtureChatClient;

impl FixtureChatClient {
    const CONVERSATION_ID: &'static str = "conv-fixture-1";
}

impl AiChatClient for FixtureChatClient {
    async fn ask(
        &self,
        _token: &str,
        conversation_id: Option<&str>,
        question: &str,
    ) -> Result<AiAnswer, ChatError> {
        Ok(AiAnswer {
            conversation_id: Some(
                conversation_id
                    .unwrap_or(Self::CONVERSATION_ID)
                    .to_string(),
            ),
            answer: Some(AnswerBody {
                summary: Some(format!("Fixture answer to: {question}")),
                blocks: vec![
                    AnswerBlock::Metrics {
                        metrics: vec![Metric {
                            label: Some("Mode".to_string()),
                            name: None,
                            value: serde_json::json!("fixture"),
                        }],
                    },
                    AnswerBlock::Suggestions {
                        items: vec!["Ask something else".to_string()],
                    },
                ],
            }),
            ..AiAnswer::default()
        })
    }
}

/// Construction-time selection between live and fixture chat clients.
pub enum AnyChatClient {
    Http(HttpChatClient),
    Fixture(FixtureChatClient),
}

impl AnyChatClient {
    /// Build the client matching the configured mode.
    pub fn from_config(config: &WaypostConfig) -> Self {
        match config.mode {
            ClientMode::Live => Self::Http(HttpChatClient::new(config.chat_url.clone())),
            ClientMode::Fixture => Self::Fixture(FixtureChatClient),
        }
    }
}

impl AiChatClient for AnyChatClient {
    async fn ask(
        &self,
        token: &str,
        conversation_id: Option<&str>,
        question: &str,
    ) -> Result<AiAnswer, ChatError> {
        match self {
            Self::Http(client) => client.ask(token, conversation_id, question).await,
            Self::Fixture(client) => client.ask(token, conversation_id, question).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_answers_keep_the_conversation_id() {
        let client = FixtureChatClient;

        let first = client.ask("tok", None, "hello").await.unwrap();
        assert_eq!(
            first.conversation_id.as_deref(),
            Some(FixtureChatClient::CONVERSATION_ID)
        );

        let followup = client.ask("tok", Some("conv-77"), "again").await.unwrap();
        assert_eq!(followup.conversation_id.as_deref(), Some("conv-77"));
        assert!(followup
            .answer
            .unwrap()
            .summary
            .unwrap()
            .contains("again"));
    }
}
