// src/routes/tasks.rs

use axum::extract::State;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::parse_body;
use crate::ai::estimate_difficulty_priority;
use crate::ai::model::{AnalysisResult, Degradation, Priority};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::AppState;

#[derive(Deserialize)]
struct AnalyzeRequest {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content_text: Option<String>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub priority: Priority,
    pub degraded: Option<Degradation>,
}

/// POST /tasks/analyze
pub async fn analyze(
    State(state): State<AppState>,
    _user: AuthUser,
    body: Bytes,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let request: AnalyzeRequest = parse_body(&body)?;
    if request.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }

    let outcome = state
        .tutor
        .analyze(
            &request.title,
            request.description.as_deref().unwrap_or_default(),
            request.content_text.as_deref(),
        )
        .await;

    // Priority follows the classification's own difficulty, not the top-level estimate.
    let priority = estimate_difficulty_priority(outcome.value.analysis.difficulty_level.into());
    Ok(Json(AnalyzeResponse {
        result: outcome.value,
        priority,
        degraded: outcome.degraded,
    }))
}
