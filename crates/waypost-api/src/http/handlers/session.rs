//! Session admin endpoints.
//!
//! Read and delete per-identity relay sessions. Access tokens are never
//! returned over the API -- responses carry only whether one is present.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use waypost_core::session::repository::SessionRepository;
use waypost_types::session::UserSession;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Session as exposed over the API: token elided, presence only.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub identity: String,
    pub has_token: bool,
    pub conversation_id: Option<String>,
    pub token_refreshed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserSession> for SessionView {
    fn from(session: UserSession) -> Self {
        Self {
            identity: session.identity,
            has_token: session.access_token.is_some(),
            conversation_id: session.conversation_id,
            token_refreshed_at: session.token_refreshed_at,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/sessions - List sessions, most recently active first.
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<SessionView>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sessions = state.sessions.list(query.limit).await?;
    let views: Vec<SessionView> = sessions.into_iter().map(SessionView::from).collect();

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(views, request_id, elapsed)))
}

/// GET /api/v1/sessions/{identity} - Show one session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<ApiResponse<SessionView>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let session = state
        .sessions
        .find_by_identity(&identity)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No session for '{identity}'")))?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(SessionView::from(session), request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{identity}"));
    Ok(Json(resp))
}

/// DELETE /api/v1/sessions/{identity} - Drop a session.
///
/// The next message from this identity re-provisions from scratch.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    state.sessions.delete_by_identity(&identity).await?;
    tracing::info!(identity = %identity, "session deleted via API");

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "identity": identity, "deleted": true }),
        request_id,
        elapsed,
    )))
}
