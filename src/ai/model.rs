// src/ai/model.rs

use serde::{Deserialize, Serialize};

/// Task classification and effort estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAnalysis {
    pub task_type: String,
    /// 1 (trivial) to 5 (very hard).
    #[serde(deserialize_with = "lenient::difficulty")]
    pub difficulty_level: u8,
    #[serde(deserialize_with = "lenient::text")]
    pub estimated_time: String,
    #[serde(default)]
    pub key_concepts: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideStep {
    pub step: u32,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    #[serde(default)]
    pub step_by_step_guide: Vec<GuideStep>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub common_mistakes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub approach: String,
    #[serde(default)]
    pub key_steps: Vec<String>,
    pub expected_outcome: String,
    #[serde(default)]
    pub validation_methods: Vec<String>,
}

/// The structured analysis the model is asked to produce for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis: TaskAnalysis,
    pub explanation: Explanation,
    pub solution: Solution,
    #[serde(deserialize_with = "lenient::difficulty")]
    pub estimated_difficulty: u8,
    pub suggested_approach: String,
    #[serde(default)]
    pub key_concepts: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl AnalysisResult {
    /// Returned when the model answered but not with the expected JSON shape.
    pub fn parse_fallback() -> Self {
        Self {
            analysis: TaskAnalysis {
                task_type: "other".to_string(),
                difficulty_level: 3,
                estimated_time: "2 hours".to_string(),
                key_concepts: strings(&["Research required"]),
                prerequisites: Vec::new(),
                learning_objectives: strings(&["Complete the assigned task"]),
            },
            explanation: Explanation {
                step_by_step_guide: vec![
                    GuideStep {
                        step: 1,
                        title: "Review the material".to_string(),
                        description: "Read the assignment carefully from start to finish".to_string(),
                    },
                    GuideStep {
                        step: 2,
                        title: "Research".to_string(),
                        description: "Look for additional sources where something is unclear".to_string(),
                    },
                    GuideStep {
                        step: 3,
                        title: "Solve".to_string(),
                        description: "Apply what you learned to complete the task".to_string(),
                    },
                ],
                tips: strings(&["Take notes while you work", "Review your work before submitting"]),
                common_mistakes: strings(&["Not reading the full instructions", "Submitting without reviewing"]),
            },
            solution: Solution {
                approach: "Follow the instructions provided".to_string(),
                key_steps: strings(&["Read", "Execute", "Review"]),
                expected_outcome: "Task completed satisfactorily".to_string(),
                validation_methods: strings(&["Self review", "Check with classmates"]),
            },
            estimated_difficulty: 3,
            suggested_approach: "Read the instructions and work through them step by step".to_string(),
            key_concepts: strings(&["Understanding the instructions", "Applying prior knowledge"]),
        }
    }

    /// Returned when the completion service could not be reached at all.
    pub fn transport_fallback() -> Self {
        Self {
            analysis: TaskAnalysis {
                task_type: "other".to_string(),
                difficulty_level: 3,
                estimated_time: "2 hours".to_string(),
                key_concepts: Vec::new(),
                prerequisites: Vec::new(),
                learning_objectives: Vec::new(),
            },
            explanation: Explanation {
                step_by_step_guide: Vec::new(),
                tips: Vec::new(),
                common_mistakes: Vec::new(),
            },
            solution: Solution {
                approach: "Follow your instructor's directions".to_string(),
                key_steps: Vec::new(),
                expected_outcome: "Task completed".to_string(),
                validation_methods: Vec::new(),
            },
            estimated_difficulty: 3,
            suggested_approach: "Read and carry out the instructions".to_string(),
            key_concepts: Vec::new(),
        }
    }
}

/// Task priority derived from the estimated difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// `>= 4` is high, `2..=3` is medium, anything lower is low.
    pub fn from_difficulty(difficulty: i64) -> Self {
        if difficulty >= 4 {
            Priority::High
        } else if difficulty >= 2 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Which conversation a chat turn belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    /// Scoped to one task; the caller usually supplies the task as context.
    Task,
    General,
}

impl ChatKind {
    /// `"task"` selects [`ChatKind::Task`]; every other value is a general chat.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("task") {
            ChatKind::Task
        } else {
            ChatKind::General
        }
    }
}

/// Tutoring style for a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    Learn,
    Review,
}

impl ChatMode {
    /// `"review"` selects [`ChatMode::Review`]; anything else, including unknown
    /// or empty values, falls back to [`ChatMode::Learn`].
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("review") {
            ChatMode::Review
        } else {
            ChatMode::Learn
        }
    }
}

pub const APOLOGY_MESSAGE: &str =
    "Sorry, something went wrong while processing your message. Please try again.";
pub const EMPTY_REPLY_MESSAGE: &str = "Sorry, I could not generate a response.";

/// One tutor reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub content: String,
    pub tokens_used: Option<u32>,
    pub model_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatReply {
    pub fn apology(model_used: &str, error: String) -> Self {
        Self {
            content: APOLOGY_MESSAGE.to_string(),
            tokens_used: None,
            model_used: model_used.to_string(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    /// `multiple_choice`, `true_false` or `short_answer`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
    /// Set from the request, not read from the model.
    #[serde(default, skip_deserializing)]
    pub difficulty: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

/// Study-habit feedback derived from recent sessions and quiz scores.
///
/// Every field is optional in the model's answer; the empty value is also
/// the fallback.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyInsights {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub optimal_study_time: String,
    #[serde(deserialize_with = "lenient::text")]
    pub suggested_session_duration: String,
    #[serde(deserialize_with = "lenient::text")]
    pub study_streak_maintenance: String,
}

/// Why a value is a fallback instead of the model's answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Degradation {
    /// The completion service failed (network, status, timeout).
    Transport(String),
    /// The service answered with text that is not the expected JSON shape.
    MalformedOutput(String),
}

/// A value that is always usable, plus a note when it is a fallback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub value: T,
    pub degraded: Option<Degradation>,
}

impl<T> Outcome<T> {
    pub fn ok(value: T) -> Self {
        Self { value, degraded: None }
    }

    pub fn degraded(value: T, reason: Degradation) -> Self {
        Self { value, degraded: Some(reason) }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    pub fn map_value<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome { value: f(self.value), degraded: self.degraded }
    }
}

/// Deserializers that accept the loose shapes models tend to produce.
mod lenient {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;
    use serde_json::Value;

    /// Accepts `3`, `3.0`, `"3"` or `"3/5"` and clamps into 1..=5.
    pub fn difficulty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let raw = match &value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse::<f64>().ok()
            }
            _ => None,
        }
        .ok_or_else(|| D::Error::custom(format!("invalid difficulty: {value}")))?;
        Ok(raw.round().clamp(1.0, 5.0) as u8)
    }

    /// Accepts a string or a bare number/bool and renders it as text.
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(D::Error::custom(format!("expected text, found {other}"))),
        }
    }
}
