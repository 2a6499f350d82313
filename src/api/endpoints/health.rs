//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core_state::CoreState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub llm_configured: bool,
    pub sessions: usize,
}

/// `GET /health`
pub async fn check(State(state): State<Arc<CoreState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Server running",
        timestamp: Utc::now(),
        version: crate::config::APP_VERSION,
        llm_configured: state.llm_configured(),
        sessions: state.sessions.len(),
    })
}
