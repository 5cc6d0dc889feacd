// src/routes/chat.rs

use axum::extract::State;
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;

use super::parse_body;
use crate::ai::model::{ChatKind, ChatReply};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::AppState;

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default = "default_mode")]
    mode: String,
    #[serde(default = "default_chat_type")]
    chat_type: String,
    #[serde(default)]
    context: String,
}

fn default_mode() -> String {
    "learn".to_string()
}

fn default_chat_type() -> String {
    "general".to_string()
}

/// POST /chat
///
/// Always answers 200 once the request is valid; model failures come back
/// as an apology with `error` set.
pub async fn chat(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    body: Bytes,
) -> Result<Json<ChatReply>, AppError> {
    let request: ChatRequest = parse_body(&body)?;
    if request.message.trim().is_empty() {
        return Err(AppError::BadRequest("message must not be empty".to_string()));
    }

    let kind = ChatKind::parse(&request.chat_type);
    info!(user = %identity.subject, ?kind, "Chat turn");
    let reply = state
        .tutor
        .chat(&request.message, kind, &request.mode, &request.context)
        .await;
    Ok(Json(reply))
}
