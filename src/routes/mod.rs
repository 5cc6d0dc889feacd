// src/routes/mod.rs

pub mod chat;
pub mod files;
pub mod health;
pub mod study;
pub mod tasks;

use axum::routing::{get, post};
use axum::Router;
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::AppState;

pub fn build_router() -> Router<AppState> {
    Router::new()
        // Unauthenticated
        .route("/health", get(health::health))
        // Authenticated endpoints
        .route("/me", get(health::me))
        .route("/chat", post(chat::chat))
        .route("/tasks/analyze", post(tasks::analyze))
        .route("/study/quiz", post(study::quiz))
        .route("/study/flashcards", post(study::flashcards))
        .route("/study/insights", post(study::insights))
        .route("/files/signed-upload", post(files::signed_upload))
}

/// Parses a JSON request body, reporting failures in the service's error shape.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid JSON: {e}")))
}
