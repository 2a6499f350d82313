//! `POST /chat`: answer a question about an uploaded report.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::chat::send_chat_message;
use crate::core_state::CoreState;

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub message: String,
    pub language: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub session_id: String,
    pub response: String,
}

pub async fn send(
    State(state): State<Arc<CoreState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.session_id.trim().is_empty() || req.message.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Session ID and message are required".into(),
        ));
    }

    let reply = tokio::task::spawn_blocking(move || {
        send_chat_message(
            &state,
            req.session_id.trim(),
            &req.message,
            req.language.as_deref(),
        )
    })
    .await??;

    Ok(Json(ChatResponse {
        success: true,
        session_id: reply.session_id,
        response: reply.response,
    }))
}
