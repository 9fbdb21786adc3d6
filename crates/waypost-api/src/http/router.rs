//! Axum router configuration with middleware.
//!
//! Admin routes live under `/api/v1/`; the provider webhook and health
//! probe sit at the top level. Generated report files are served
//! statically from the report directory under `/reports` so the
//! messaging provider can fetch media by URL.
//! Middleware: CORS, request tracing.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let reports_dir = state.reports.dir().to_path_buf();

    let api_routes = Router::new()
        .route("/sessions", get(handlers::session::list_sessions))
        .route(
            "/sessions/{identity}",
            get(handlers::session::get_session).delete(handlers::session::delete_session),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/webhooks/inbound", post(handlers::webhook::receive_inbound))
        .route("/health", get(health_check))
        .nest_service("/reports", ServeDir::new(reports_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe.
async fn health_check() -> &'static str {
    "OK"
}
