//! `POST /clear_session`

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::labs::clear_session;

/// Body of the endpoints that only name a session.
#[derive(Deserialize)]
pub struct SessionRequest {
    #[serde(default)]
    pub session_id: String,
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: &'static str,
}

pub async fn clear(
    State(state): State<Arc<CoreState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ClearResponse>, ApiError> {
    tokio::task::spawn_blocking(move || clear_session(&state, &req.session_id)).await??;
    Ok(Json(ClearResponse {
        success: true,
        message: "Session cleared",
    }))
}
