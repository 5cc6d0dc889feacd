// src/ai.rs

pub mod client;
pub mod model;
pub mod parse;
pub mod prompts;

use client::{ChatMessage, CompletionModel, CompletionRequest};
use model::{
    AnalysisResult, ChatKind, ChatMode, ChatReply, Degradation, Flashcard, Outcome, Priority,
    QuizQuestion, StudyInsights, EMPTY_REPLY_MESSAGE,
};
use parse::parse_loose;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

const ANALYSIS_TEMPERATURE: f32 = 0.3;
const ANALYSIS_MAX_TOKENS: u32 = 2000;
const CHAT_TEMPERATURE: f32 = 0.7;
const CHAT_MAX_TOKENS: u32 = 1000;
const QUIZ_TEMPERATURE: f32 = 0.7;
const QUIZ_MAX_TOKENS: u32 = 1500;
const FLASHCARD_TEMPERATURE: f32 = 0.6;
const FLASHCARD_MAX_TOKENS: u32 = 1200;
const STUDY_TEMPERATURE: f32 = 0.4;
const STUDY_MAX_TOKENS: u32 = 800;

/// Maps a 1–5 difficulty onto a task priority.
pub fn estimate_difficulty_priority(difficulty: i64) -> Priority {
    Priority::from_difficulty(difficulty)
}

/// AI tutoring on top of a completion model.
///
/// None of the operations fail: model or network problems produce a fixed
/// fallback value, annotated so callers can tell it apart from a real answer.
#[derive(Clone)]
pub struct Tutor {
    model: Arc<dyn CompletionModel>,
}

impl Tutor {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.model()
    }

    /// Produces a structured analysis of a task.
    ///
    /// Unparseable output yields [`AnalysisResult::parse_fallback`]; a failed
    /// call yields the more minimal [`AnalysisResult::transport_fallback`].
    #[instrument(skip_all, fields(title = %title))]
    pub async fn analyze(&self, title: &str, description: &str, extracted_text: Option<&str>) -> Outcome<AnalysisResult> {
        let request = CompletionRequest {
            messages: vec![ChatMessage::user(prompts::analysis_prompt(title, description, extracted_text))],
            temperature: ANALYSIS_TEMPERATURE,
            max_tokens: ANALYSIS_MAX_TOKENS,
        };

        match self.model.complete(&request).await {
            Ok(completion) => match parse_loose::<AnalysisResult>(&completion.text) {
                Ok(result) => {
                    info!(difficulty = result.estimated_difficulty, "Task analysis generated");
                    Outcome::ok(result)
                }
                Err(e) => {
                    warn!(error = %e, "Model returned an unparseable analysis, using fallback");
                    Outcome::degraded(
                        AnalysisResult::parse_fallback(),
                        Degradation::MalformedOutput(e.to_string()),
                    )
                }
            },
            Err(e) => {
                error!(error = %e, "Task analysis request failed, using fallback");
                Outcome::degraded(
                    AnalysisResult::transport_fallback(),
                    Degradation::Transport(e.to_string()),
                )
            }
        }
    }

    /// Answers one chat turn. Unknown modes are treated as `learn`.
    ///
    /// On failure the reply carries a fixed apology and `error` is set.
    #[instrument(skip_all, fields(kind = ?kind, mode = %mode))]
    pub async fn chat(&self, user_message: &str, kind: ChatKind, mode: &str, context: &str) -> ChatReply {
        let system = prompts::chat_system_prompt(kind, ChatMode::parse(mode), context);
        let request = CompletionRequest {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user_message)],
            temperature: CHAT_TEMPERATURE,
            max_tokens: CHAT_MAX_TOKENS,
        };

        match self.model.complete(&request).await {
            Ok(completion) => {
                let content = completion.text.trim();
                let content = if content.is_empty() { EMPTY_REPLY_MESSAGE } else { content };
                ChatReply {
                    content: content.to_string(),
                    tokens_used: completion.total_tokens,
                    model_used: self.model_name().to_string(),
                    error: None,
                }
            }
            Err(e) => {
                error!(error = %e, "Chat completion failed");
                ChatReply::apology(self.model_name(), e.to_string())
            }
        }
    }

    /// Generates quiz questions; any failure yields an empty list.
    #[instrument(skip(self))]
    pub async fn generate_quiz(&self, subject: &str, topic: &str, difficulty: u8, count: u32) -> Outcome<Vec<QuizQuestion>> {
        let difficulty = difficulty.clamp(1, 5);
        let request = CompletionRequest {
            messages: vec![ChatMessage::user(prompts::quiz_prompt(subject, topic, difficulty, count))],
            temperature: QUIZ_TEMPERATURE,
            max_tokens: QUIZ_MAX_TOKENS,
        };

        self.list_outcome(&request).await.map_value(|questions| {
            questions
                .into_iter()
                .map(|q| QuizQuestion { difficulty, ..q })
                .collect()
        })
    }

    /// Generates flashcards from study material; any failure yields an empty list.
    #[instrument(skip(self, content))]
    pub async fn generate_flashcards(&self, content: &str, subject: &str, count: u32) -> Outcome<Vec<Flashcard>> {
        let request = CompletionRequest {
            messages: vec![ChatMessage::user(prompts::flashcards_prompt(content, subject, count))],
            temperature: FLASHCARD_TEMPERATURE,
            max_tokens: FLASHCARD_MAX_TOKENS,
        };
        self.list_outcome(&request).await
    }

    /// Reviews recent study sessions and quiz scores.
    ///
    /// Only the last 10 sessions and last 5 scores are sent. Any failure
    /// yields empty insights.
    #[instrument(skip_all, fields(sessions = sessions.len(), quiz_scores = quiz_scores.len()))]
    pub async fn analyze_study_pattern(&self, sessions: &[Value], quiz_scores: &[Value]) -> Outcome<StudyInsights> {
        let request = CompletionRequest {
            messages: vec![ChatMessage::user(prompts::study_pattern_prompt(sessions, quiz_scores))],
            temperature: STUDY_TEMPERATURE,
            max_tokens: STUDY_MAX_TOKENS,
        };

        match self.model.complete(&request).await {
            Ok(completion) => match parse_loose::<StudyInsights>(&completion.text) {
                Ok(insights) => Outcome::ok(insights),
                Err(e) => {
                    warn!(error = %e, "Model returned unparseable study insights");
                    Outcome::degraded(StudyInsights::default(), Degradation::MalformedOutput(e.to_string()))
                }
            },
            Err(e) => {
                error!(error = %e, "Study pattern request failed");
                Outcome::degraded(StudyInsights::default(), Degradation::Transport(e.to_string()))
            }
        }
    }

    async fn list_outcome<T: serde::de::DeserializeOwned>(&self, request: &CompletionRequest) -> Outcome<Vec<T>> {
        match self.model.complete(request).await {
            Ok(completion) => match parse_loose::<Vec<T>>(&completion.text) {
                Ok(items) => Outcome::ok(items),
                Err(e) => {
                    warn!(error = %e, "Model returned an unparseable list");
                    Outcome::degraded(Vec::new(), Degradation::MalformedOutput(e.to_string()))
                }
            },
            Err(e) => {
                error!(error = %e, "Completion request failed");
                Outcome::degraded(Vec::new(), Degradation::Transport(e.to_string()))
            }
        }
    }
}
