//! Relay service orchestrating session lifecycle and AI calls.
//!
//! `RelayService` resolves a usable token for an identity (provisioning a
//! session on first contact, refreshing proactively near expiry), issues
//! the chat call, and applies a bounded recovery policy when the backend
//! signals a stale token or an unrecognized conversation id.
//!
//! Retries are capped at one attempt per failure class, so a single
//! inbound message costs at most two chat-backend calls and two
//! token-authority calls. A simultaneous stale token AND stale
//! conversation id is intentionally not chased further -- it surfaces as
//! a terminal error rather than an open-ended retry loop.

use chrono::Utc;
use tracing::{info, warn};

use waypost_types::answer::AiAnswer;
use waypost_types::error::{ChatError, RelayError};
use waypost_types::session::UserSession;

use crate::chat::client::AiChatClient;
use crate::session::repository::SessionRepository;
use crate::token::client::TokenClient;
use crate::token::expiry;

/// Orchestrates the per-message session/token/retry flow.
///
/// Generic over its three collaborators to maintain clean architecture
/// (waypost-core never depends on waypost-infra).
pub struct RelayService<T: TokenClient, C: AiChatClient, S: SessionRepository> {
    tokens: T,
    chat: C,
    sessions: S,
}

impl<T: TokenClient, C: AiChatClient, S: SessionRepository> RelayService<T, C, S> {
    /// Create a new relay service with the given collaborators.
    pub fn new(tokens: T, chat: C, sessions: S) -> Self {
        Self {
            tokens,
            chat,
            sessions,
        }
    }

    /// Access the session repository.
    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Relay one inbound message and return the backend's answer.
    ///
    /// Persistence checkpoints are explicit: after session creation, after
    /// each token refresh, and after each conversation-id change.
    pub async fn handle(&self, identity: &str, text: &str) -> Result<AiAnswer, RelayError> {
        let mut session = match self.sessions.find_by_identity(identity).await? {
            None => self.provision_session(identity).await?,
            Some(existing) => self.refresh_if_stale(existing).await?,
        };

        let token = session.access_token.clone().unwrap_or_default();
        let conversation_id = session.conversation_id.clone();

        match self
            .chat
            .ask(&token, conversation_id.as_deref(), text)
            .await
        {
            Ok(answer) => {
                self.store_conversation_id(&mut session, &answer).await?;
                Ok(answer)
            }
            Err(ChatError::Unauthenticated) => {
                info!(identity, "chat backend rejected the token, refreshing reactively");
                self.refresh_and_retry(&mut session, text).await
            }
            Err(ChatError::InvalidConversation) => {
                info!(identity, "conversation id rejected, requesting a fresh dialogue");
                self.retry_without_conversation(&mut session, &token, text)
                    .await
            }
            Err(err) => Err(RelayError::Chat(err)),
        }
    }

    /// First contact: fetch a token and persist a new session.
    ///
    /// A brand-new user with no working credential cannot proceed, so a
    /// token-authority failure propagates immediately with no retry.
    async fn provision_session(&self, identity: &str) -> Result<UserSession, RelayError> {
        info!(identity, "first contact, provisioning session");
        let token = self.tokens.fetch_token(identity).await?;
        let session = UserSession::provisioned(identity, token, Utc::now());
        self.sessions.upsert(&session).await?;
        Ok(session)
    }

    /// Proactively refresh the token when it is at or past the safety
    /// window. A refresh failure here is logged and swallowed: the stored
    /// token is sent anyway, and a genuinely dead token comes back as a
    /// 401 that the reactive path corrects.
    async fn refresh_if_stale(&self, mut session: UserSession) -> Result<UserSession, RelayError> {
        if !expiry::is_expired(session.access_token.as_deref()) {
            return Ok(session);
        }

        info!(identity = %session.identity, "token inside expiry window, refreshing proactively");
        match self.tokens.fetch_token(&session.identity).await {
            Ok(token) => {
                self.persist_token(&mut session, token).await?;
            }
            Err(err) => {
                warn!(
                    identity = %session.identity,
                    error = %err,
                    "proactive token refresh failed, proceeding with stored token"
                );
            }
        }
        Ok(session)
    }

    /// One reactive refresh cycle after a 401: fetch a new token, persist
    /// it, and retry the chat call once with the *same* conversation id.
    /// Any failure in this cycle is terminal.
    async fn refresh_and_retry(
        &self,
        session: &mut UserSession,
        text: &str,
    ) -> Result<AiAnswer, RelayError> {
        let token = match self.tokens.fetch_token(&session.identity).await {
            Ok(token) => token,
            Err(err) => {
                warn!(identity = %session.identity, error = %err, "reactive token refresh failed");
                return Err(RelayError::AiServiceUnavailable);
            }
        };
        self.persist_token(session, token.clone()).await?;

        match self
            .chat
            .ask(&token, session.conversation_id.as_deref(), text)
            .await
        {
            Ok(answer) => {
                self.store_conversation_id(session, &answer).await?;
                Ok(answer)
            }
            Err(err) => {
                warn!(identity = %session.identity, error = %err, "retry after reactive refresh failed");
                Err(RelayError::AiServiceUnavailable)
            }
        }
    }

    /// One retry with the conversation id cleared and the current token
    /// unchanged. A failure here surfaces as-is -- this path never
    /// re-enters auth-failure handling.
    async fn retry_without_conversation(
        &self,
        session: &mut UserSession,
        token: &str,
        text: &str,
    ) -> Result<AiAnswer, RelayError> {
        let answer = self
            .chat
            .ask(token, None, text)
            .await
            .map_err(RelayError::Chat)?;
        self.store_conversation_id(session, &answer).await?;
        Ok(answer)
    }

    /// Overwrite the stored token and refresh timestamp.
    async fn persist_token(
        &self,
        session: &mut UserSession,
        token: String,
    ) -> Result<(), RelayError> {
        let now = Utc::now();
        session.access_token = Some(token);
        session.token_refreshed_at = Some(now);
        session.updated_at = now;
        self.sessions.upsert(session).await?;
        Ok(())
    }

    /// Persist a backend-supplied conversation id when it is present and
    /// differs from the stored one. The relay never invents an id.
    async fn store_conversation_id(
        &self,
        session: &mut UserSession,
        answer: &AiAnswer,
    ) -> Result<(), RelayError> {
        let Some(new_id) = answer.conversation_id.as_deref() else {
            return Ok(());
        };
        if session.conversation_id.as_deref() == Some(new_id) {
            return Ok(());
        }

        session.conversation_id = Some(new_id.to_string());
        session.updated_at = Utc::now();
        self.sessions.upsert(session).await?;
        info!(
            identity = %session.identity,
            conversation_id = new_id,
            "conversation id updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use waypost_types::error::{RepositoryError, TokenError};

    /// Token client fed from a queue of canned results; records call count.
    struct ScriptedTokens {
        results: Mutex<Vec<Result<String, TokenError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedTokens {
        fn new(results: Vec<Result<String, TokenError>>) -> Self {
            Self {
                results: Mutex::new(results),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl TokenClient for ScriptedTokens {
        async fn fetch_token(&self, _identity: &str) -> Result<String, TokenError> {
            *self.calls.lock().unwrap() += 1;
            let mut results = self.results.lock().unwrap();
            assert!(!results.is_empty(), "unexpected token-authority call");
            results.remove(0)
        }
    }

    /// Recorded arguments of one chat call.
    #[derive(Debug, Clone, PartialEq)]
    struct AskCall {
        token: String,
        conversation_id: Option<String>,
        question: String,
    }

    /// Chat client fed from a queue of canned results; records every call.
    struct ScriptedChat {
        results: Mutex<Vec<Result<AiAnswer, ChatError>>>,
        calls: Mutex<Vec<AskCall>>,
    }

    impl ScriptedChat {
        fn new(results: Vec<Result<AiAnswer, ChatError>>) -> Self {
            Self {
                results: Mutex::new(results),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<AskCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AiChatClient for ScriptedChat {
        async fn ask(
            &self,
            token: &str,
            conversation_id: Option<&str>,
            question: &str,
        ) -> Result<AiAnswer, ChatError> {
            self.calls.lock().unwrap().push(AskCall {
                token: token.to_string(),
                conversation_id: conversation_id.map(str::to_string),
                question: question.to_string(),
            });
            let mut results = self.results.lock().unwrap();
            assert!(!results.is_empty(), "unexpected chat-backend call");
            results.remove(0)
        }
    }

    /// In-memory session store; counts upserts.
    struct MemorySessions {
        records: Mutex<HashMap<String, UserSession>>,
        upserts: Mutex<u32>,
    }

    impl MemorySessions {
        fn new() -> Self {
            Self {
                records: Mutex::new(HashMap::new()),
                upserts: Mutex::new(0),
            }
        }

        fn with_session(session: UserSession) -> Self {
            let store = Self::new();
            store
                .records
                .lock()
                .unwrap()
                .insert(session.identity.clone(), session);
            store
        }

        fn get(&self, identity: &str) -> Option<UserSession> {
            self.records.lock().unwrap().get(identity).cloned()
        }

        fn upserts(&self) -> u32 {
            *self.upserts.lock().unwrap()
        }
    }

    impl SessionRepository for MemorySessions {
        async fn find_by_identity(
            &self,
            identity: &str,
        ) -> Result<Option<UserSession>, RepositoryError> {
            Ok(self.records.lock().unwrap().get(identity).cloned())
        }

        async fn upsert(&self, session: &UserSession) -> Result<(), RepositoryError> {
            *self.upserts.lock().unwrap() += 1;
            self.records
                .lock()
                .unwrap()
                .insert(session.identity.clone(), session.clone());
            Ok(())
        }

        async fn list(&self, _limit: Option<i64>) -> Result<Vec<UserSession>, RepositoryError> {
            Ok(self.records.lock().unwrap().values().cloned().collect())
        }

        async fn delete_by_identity(&self, identity: &str) -> Result<(), RepositoryError> {
            match self.records.lock().unwrap().remove(identity) {
                Some(_) => Ok(()),
                None => Err(RepositoryError::NotFound),
            }
        }

        async fn count(&self) -> Result<u64, RepositoryError> {
            Ok(self.records.lock().unwrap().len() as u64)
        }
    }

    fn answer_with_conversation(id: &str) -> AiAnswer {
        AiAnswer {
            conversation_id: Some(id.to_string()),
            text: Some("hi".to_string()),
            ..AiAnswer::default()
        }
    }

    /// Unsigned JWT with the given `exp` offset from now, in seconds.
    fn token_expiring_in(offset_secs: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let claims = serde_json::json!({ "exp": Utc::now().timestamp() + offset_secs });
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{header}.{payload}.sig")
    }

    fn existing_session(identity: &str, token: &str, conversation_id: Option<&str>) -> UserSession {
        let now = Utc::now();
        UserSession {
            identity: identity.to_string(),
            access_token: Some(token.to_string()),
            conversation_id: conversation_id.map(str::to_string),
            token_refreshed_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn first_contact_provisions_session_then_asks() {
        let tokens = ScriptedTokens::new(vec![Ok("tok_A".to_string())]);
        let chat = ScriptedChat::new(vec![Ok(answer_with_conversation("c1"))]);
        let relay = RelayService::new(tokens, chat, MemorySessions::new());

        let answer = relay.handle("+1555", "hello").await.unwrap();
        assert_eq!(answer.conversation_id.as_deref(), Some("c1"));

        assert_eq!(relay.tokens.calls(), 1);
        let calls = relay.chat.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].token, "tok_A");
        assert_eq!(calls[0].conversation_id, None);
        assert_eq!(calls[0].question, "hello");

        let stored = relay.sessions.get("+1555").unwrap();
        assert_eq!(stored.access_token.as_deref(), Some("tok_A"));
        assert_eq!(stored.conversation_id.as_deref(), Some("c1"));
        assert_eq!(relay.sessions.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn first_contact_auth_failure_propagates_without_session() {
        let tokens = ScriptedTokens::new(vec![Err(TokenError::Status(502))]);
        let chat = ScriptedChat::new(vec![]);
        let relay = RelayService::new(tokens, chat, MemorySessions::new());

        let err = relay.handle("+1555", "hello").await.unwrap_err();
        assert!(matches!(err, RelayError::AuthProvider(_)));
        assert!(relay.chat.calls().is_empty());
        assert!(relay.sessions.get("+1555").is_none());
    }

    #[tokio::test]
    async fn fresh_token_skips_the_token_authority() {
        let session = existing_session("+1555", &token_expiring_in(3600), Some("c1"));
        let tokens = ScriptedTokens::new(vec![]);
        let chat = ScriptedChat::new(vec![Ok(answer_with_conversation("c1"))]);
        let relay = RelayService::new(tokens, chat, MemorySessions::with_session(session));

        relay.handle("+1555", "hi").await.unwrap();
        assert_eq!(relay.tokens.calls(), 0);
        assert_eq!(relay.chat.calls()[0].conversation_id.as_deref(), Some("c1"));
        // Same conversation id comes back: no write.
        assert_eq!(relay.sessions.upserts(), 0);
    }

    #[tokio::test]
    async fn expired_token_refreshes_proactively_before_asking() {
        let session = existing_session("+1555", &token_expiring_in(10), Some("c1"));
        let tokens = ScriptedTokens::new(vec![Ok("tok_B".to_string())]);
        let chat = ScriptedChat::new(vec![Ok(AiAnswer::default())]);
        let relay = RelayService::new(tokens, chat, MemorySessions::with_session(session));

        relay.handle("+1555", "hi").await.unwrap();

        assert_eq!(relay.tokens.calls(), 1);
        assert_eq!(relay.chat.calls()[0].token, "tok_B");
        assert_eq!(
            relay.sessions.get("+1555").unwrap().access_token.as_deref(),
            Some("tok_B")
        );
    }

    #[tokio::test]
    async fn proactive_refresh_failure_proceeds_with_stored_token() {
        let stale = token_expiring_in(-100);
        let session = existing_session("+1555", &stale, None);
        let tokens = ScriptedTokens::new(vec![Err(TokenError::Transport("down".to_string()))]);
        let chat = ScriptedChat::new(vec![Ok(AiAnswer::default())]);
        let relay = RelayService::new(tokens, chat, MemorySessions::with_session(session));

        relay.handle("+1555", "hi").await.unwrap();

        // Fail-open: the stale token went out unchanged.
        assert_eq!(relay.chat.calls()[0].token, stale);
        assert_eq!(
            relay.sessions.get("+1555").unwrap().access_token.as_deref(),
            Some(stale.as_str())
        );
    }

    #[tokio::test]
    async fn unauthenticated_triggers_one_refresh_and_one_retry() {
        let session = existing_session("+1555", &token_expiring_in(3600), Some("c-old"));
        let tokens = ScriptedTokens::new(vec![Ok("tok_C".to_string())]);
        let chat = ScriptedChat::new(vec![
            Err(ChatError::Unauthenticated),
            Ok(answer_with_conversation("c-old")),
        ]);
        let relay = RelayService::new(tokens, chat, MemorySessions::with_session(session));

        let answer = relay.handle("+1555", "hi").await.unwrap();
        assert_eq!(answer.conversation_id.as_deref(), Some("c-old"));

        assert_eq!(relay.tokens.calls(), 1);
        let calls = relay.chat.calls();
        assert_eq!(calls.len(), 2);
        // Retry carries the new token and the SAME conversation id.
        assert_eq!(calls[1].token, "tok_C");
        assert_eq!(calls[1].conversation_id.as_deref(), Some("c-old"));

        assert_eq!(
            relay.sessions.get("+1555").unwrap().access_token.as_deref(),
            Some("tok_C")
        );
    }

    #[tokio::test]
    async fn failed_retry_after_refresh_is_terminal() {
        let session = existing_session("+1555", &token_expiring_in(3600), Some("c1"));
        let tokens = ScriptedTokens::new(vec![Ok("tok_C".to_string())]);
        let chat = ScriptedChat::new(vec![
            Err(ChatError::Unauthenticated),
            Err(ChatError::Unauthenticated),
        ]);
        let relay = RelayService::new(tokens, chat, MemorySessions::with_session(session));

        let err = relay.handle("+1555", "hi").await.unwrap_err();
        assert!(matches!(err, RelayError::AiServiceUnavailable));
        // Exactly one refresh, exactly two asks, nothing further.
        assert_eq!(relay.tokens.calls(), 1);
        assert_eq!(relay.chat.calls().len(), 2);
    }

    #[tokio::test]
    async fn failed_reactive_refresh_is_terminal_without_second_ask() {
        let session = existing_session("+1555", &token_expiring_in(3600), Some("c1"));
        let tokens = ScriptedTokens::new(vec![Err(TokenError::MissingToken)]);
        let chat = ScriptedChat::new(vec![Err(ChatError::Unauthenticated)]);
        let relay = RelayService::new(tokens, chat, MemorySessions::with_session(session));

        let err = relay.handle("+1555", "hi").await.unwrap_err();
        assert!(matches!(err, RelayError::AiServiceUnavailable));
        assert_eq!(relay.chat.calls().len(), 1);
    }

    #[tokio::test]
    async fn invalid_conversation_retries_with_null_id_and_same_token() {
        let good = token_expiring_in(3600);
        let session = existing_session("+1555", &good, Some("c-stale"));
        let tokens = ScriptedTokens::new(vec![]);
        let chat = ScriptedChat::new(vec![
            Err(ChatError::InvalidConversation),
            Ok(answer_with_conversation("c-new")),
        ]);
        let relay = RelayService::new(tokens, chat, MemorySessions::with_session(session));

        relay.handle("+1555", "hi").await.unwrap();

        // No token-authority traffic on this path.
        assert_eq!(relay.tokens.calls(), 0);
        let calls = relay.chat.calls();
        assert_eq!(calls[0].conversation_id.as_deref(), Some("c-stale"));
        assert_eq!(calls[1].conversation_id, None);
        assert_eq!(calls[1].token, good);

        assert_eq!(
            relay.sessions.get("+1555").unwrap().conversation_id.as_deref(),
            Some("c-new")
        );
    }

    #[tokio::test]
    async fn invalid_conversation_retry_failure_surfaces_as_is() {
        let session = existing_session("+1555", &token_expiring_in(3600), Some("c1"));
        let tokens = ScriptedTokens::new(vec![]);
        let chat = ScriptedChat::new(vec![
            Err(ChatError::InvalidConversation),
            Err(ChatError::Unauthenticated),
        ]);
        let relay = RelayService::new(tokens, chat, MemorySessions::with_session(session));

        let err = relay.handle("+1555", "hi").await.unwrap_err();
        // The retry's own classification, not AiServiceUnavailable: the
        // reset path never recurses into auth handling.
        assert!(matches!(err, RelayError::Chat(ChatError::Unauthenticated)));
        assert_eq!(relay.tokens.calls(), 0);
        assert_eq!(relay.chat.calls().len(), 2);
    }

    #[tokio::test]
    async fn unavailable_propagates_without_retry() {
        let session = existing_session("+1555", &token_expiring_in(3600), None);
        let tokens = ScriptedTokens::new(vec![]);
        let chat = ScriptedChat::new(vec![Err(ChatError::Unavailable("HTTP 503".to_string()))]);
        let relay = RelayService::new(tokens, chat, MemorySessions::with_session(session));

        let err = relay.handle("+1555", "hi").await.unwrap_err();
        assert!(matches!(err, RelayError::Chat(ChatError::Unavailable(_))));
        assert_eq!(relay.chat.calls().len(), 1);
    }

    #[tokio::test]
    async fn conversation_id_unchanged_when_response_omits_it() {
        let session = existing_session("+1555", &token_expiring_in(3600), Some("c1"));
        let tokens = ScriptedTokens::new(vec![]);
        let chat = ScriptedChat::new(vec![Ok(AiAnswer::default())]);
        let relay = RelayService::new(tokens, chat, MemorySessions::with_session(session));

        relay.handle("+1555", "hi").await.unwrap();
        assert_eq!(
            relay.sessions.get("+1555").unwrap().conversation_id.as_deref(),
            Some("c1")
        );
        assert_eq!(relay.sessions.upserts(), 0);
    }

    #[tokio::test]
    async fn conversation_id_updated_when_response_differs() {
        let session = existing_session("+1555", &token_expiring_in(3600), Some("c1"));
        let tokens = ScriptedTokens::new(vec![]);
        let chat = ScriptedChat::new(vec![Ok(answer_with_conversation("c2"))]);
        let relay = RelayService::new(tokens, chat, MemorySessions::with_session(session));

        relay.handle("+1555", "hi").await.unwrap();
        assert_eq!(
            relay.sessions.get("+1555").unwrap().conversation_id.as_deref(),
            Some("c2")
        );
        assert_eq!(relay.sessions.upserts(), 1);
    }
}
