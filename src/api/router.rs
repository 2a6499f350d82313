//! HTTP router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! CORS is permissive and the request body limit follows
//! `AppConfig::max_upload_bytes`.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::core_state::CoreState;

// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(state: Arc<CoreState>) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/upload_pdf", post(endpoints::documents::upload_pdf))
        .route("/upload", post(endpoints::documents::upload_report))
        .route("/chat", post(endpoints::chat::send))
        .route("/api/results/:session_id", get(endpoints::labs::results))
        .route(
            "/export_results/:session_id/:format",
            get(endpoints::labs::export_results),
        )
        .route(
            "/export_conversation",
            post(endpoints::labs::export_conversation),
        )
        .route("/clear_session", post(endpoints::session::clear))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
