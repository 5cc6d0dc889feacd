// src/routes/study.rs

use axum::extract::State;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::parse_body;
use crate::ai::model::{Degradation, Flashcard, QuizQuestion, StudyInsights};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::AppState;

/// Upper bound on generated items per request.
const MAX_ITEMS: u32 = 30;

#[derive(Deserialize)]
struct QuizRequest {
    subject: String,
    topic: String,
    #[serde(default = "default_difficulty")]
    difficulty: u8,
    #[serde(default = "default_count")]
    num_questions: u32,
}

#[derive(Deserialize)]
struct FlashcardRequest {
    content: String,
    subject: String,
    #[serde(default = "default_count")]
    num_cards: u32,
}

#[derive(Deserialize)]
struct InsightsRequest {
    #[serde(default)]
    sessions: Vec<Value>,
    #[serde(default)]
    quiz_scores: Vec<Value>,
}

#[derive(Serialize)]
pub struct InsightsResponse {
    #[serde(flatten)]
    pub insights: StudyInsights,
    pub degraded: Option<Degradation>,
}

fn default_difficulty() -> u8 {
    3
}

fn default_count() -> u32 {
    10
}

fn check_count(count: u32) -> Result<u32, AppError> {
    if (1..=MAX_ITEMS).contains(&count) {
        Ok(count)
    } else {
        Err(AppError::BadRequest(format!("count must be between 1 and {MAX_ITEMS}")))
    }
}

/// POST /study/quiz
pub async fn quiz(
    State(state): State<AppState>,
    _user: AuthUser,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let request: QuizRequest = parse_body(&body)?;
    let count = check_count(request.num_questions)?;

    let outcome = state
        .tutor
        .generate_quiz(&request.subject, &request.topic, request.difficulty, count)
        .await;
    Ok(Json(list_body::<QuizQuestion>("questions", outcome.value, outcome.degraded)?))
}

/// POST /study/flashcards
pub async fn flashcards(
    State(state): State<AppState>,
    _user: AuthUser,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let request: FlashcardRequest = parse_body(&body)?;
    let count = check_count(request.num_cards)?;
    if request.content.trim().is_empty() {
        return Err(AppError::BadRequest("content must not be empty".to_string()));
    }

    let outcome = state
        .tutor
        .generate_flashcards(&request.content, &request.subject, count)
        .await;
    Ok(Json(list_body::<Flashcard>("flashcards", outcome.value, outcome.degraded)?))
}

/// POST /study/insights
pub async fn insights(
    State(state): State<AppState>,
    _user: AuthUser,
    body: Bytes,
) -> Result<Json<InsightsResponse>, AppError> {
    let request: InsightsRequest = parse_body(&body)?;

    let outcome = state
        .tutor
        .analyze_study_pattern(&request.sessions, &request.quiz_scores)
        .await;
    Ok(Json(InsightsResponse {
        insights: outcome.value,
        degraded: outcome.degraded,
    }))
}

fn list_body<T: serde::Serialize>(
    field: &str,
    items: Vec<T>,
    degraded: Option<Degradation>,
) -> Result<Value, AppError> {
    let mut body = serde_json::Map::new();
    body.insert(field.to_string(), serde_json::to_value(items).map_err(|e| AppError::Internal(e.into()))?);
    body.insert(
        "degraded".to_string(),
        serde_json::to_value(degraded).map_err(|e| AppError::Internal(e.into()))?,
    );
    Ok(Value::Object(body))
}
