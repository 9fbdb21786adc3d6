//! Inbound message webhook for the messaging provider.
//!
//! The provider posts form-urlencoded `From`/`Body` fields for each user
//! message. The handler acknowledges immediately with an empty TwiML
//! envelope -- the provider retries on slow responses, and the relay's
//! round trips (token authority, chat backend, reply send) can take
//! seconds -- then processes the message in a spawned background task.
//!
//! When `WAYPOST_WEBHOOK_SECRET` is set, requests must carry an
//! HMAC-SHA256 signature over the raw body in `x-waypost-signature`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{error, info, warn};

use waypost_core::format::{render_reply, suggestions_section, RenderOptions, SECTION_DIVIDER};
use waypost_core::transport::messenger::Messenger;
use waypost_infra::webhook::verify_signature;
use waypost_types::answer::AiAnswer;
use waypost_types::error::MessengerError;

use crate::http::error::AppError;
use crate::state::AppState;

/// Signature header checked when a webhook secret is configured.
const SIGNATURE_HEADER: &str = "x-waypost-signature";

/// Empty TwiML envelope: "received, no immediate reply".
const TWIML_ACK: &str = "<Response></Response>";

/// Reply sent whenever the relay or delivery fails.
const UNAVAILABLE_REPLY: &str = "We are currently unavailable. Please try again later.";

/// Inbound form fields. Anything beyond sender and text is ignored.
#[derive(Debug, Deserialize)]
pub struct InboundForm {
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "Body")]
    pub body: Option<String>,
}

/// POST /webhooks/inbound - Receive an inbound user message.
///
/// Verifies the optional HMAC signature over the raw body, then acks
/// with empty TwiML and hands the message to a background task. A
/// request missing `From`/`Body` is still acked, then logged and
/// dropped.
pub async fn receive_inbound(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    if let Some(secret) = &state.webhook_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing webhook signature".to_string()))?;

        verify_signature(secret.expose_secret().as_bytes(), &body, signature)
            .map_err(|_| AppError::Unauthorized("webhook signature verification failed".to_string()))?;
    }

    let form: InboundForm = serde_urlencoded::from_bytes(&body)
        .map_err(|e| AppError::Validation(format!("malformed form body: {e}")))?;

    // Ack first; the relay round trips run in the background.
    tokio::spawn(process_inbound(state, form));

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        TWIML_ACK,
    )
        .into_response())
}

/// Relay one inbound message and deliver the reply.
async fn process_inbound(state: AppState, form: InboundForm) {
    let (Some(from), Some(text)) = (form.from, form.body) else {
        warn!("inbound webhook missing From or Body, dropping");
        return;
    };

    let identity = canonical_identity(&from);
    info!(identity, "processing inbound message");

    match state.relay.handle(identity, &text).await {
        Ok(answer) => {
            if let Err(err) = deliver_reply(&state, &from, &answer).await {
                error!(error = %err, identity, "reply delivery failed");
                send_unavailable(&state, &from).await;
            }
        }
        Err(err) => {
            error!(error = %err, identity, "relay failed");
            send_unavailable(&state, &from).await;
        }
    }
}

/// Strip the provider's channel prefix from the sender address.
fn canonical_identity(from: &str) -> &str {
    from.strip_prefix("whatsapp:").unwrap_or(from)
}

/// Render and send the answer: as a report link with a caption when it
/// carries a table, otherwise as plain text with inline suggestions.
async fn deliver_reply(
    state: &AppState,
    to: &str,
    answer: &AiAnswer,
) -> Result<(), MessengerError> {
    if let Some(table) = answer.first_table() {
        match state.reports.write_table(table).await {
            Ok(report) => {
                let rendered = render_reply(answer, &RenderOptions { omit_tables: true });
                let caption = format!("{}\n🔗 Link: {}", rendered.body, report.public_url);
                state
                    .messenger
                    .send(to, &caption, Some(&report.public_url))
                    .await?;

                // Suggestions go out as a separate message for readability.
                if let Some(section) = suggestions_section(&rendered.suggestions) {
                    state.messenger.send(to, &section, None).await?;
                }
                return Ok(());
            }
            Err(err) => {
                warn!(error = %err, "report generation failed, falling back to text reply");
            }
        }
    }

    let rendered = render_reply(answer, &RenderOptions::default());
    let mut body = rendered.body;
    if let Some(section) = suggestions_section(&rendered.suggestions) {
        body.push_str(SECTION_DIVIDER);
        body.push_str(&section);
    }
    state.messenger.send(to, &body, None).await
}

async fn send_unavailable(state: &AppState, to: &str) {
    if let Err(err) = state.messenger.send(to, UNAVAILABLE_REPLY, None).await {
        error!(error = %err, "failed to send the unavailable notice");
    }
}
