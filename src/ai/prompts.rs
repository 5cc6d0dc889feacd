// src/ai/prompts.rs

use super::model::{ChatKind, ChatMode};
use serde_json::Value;

/// Longest prefix of extracted file text sent with an analysis request.
pub const MAX_EXTRACTED_CHARS: usize = 2000;
/// Longest prefix of study material sent with a flashcard request.
pub const MAX_FLASHCARD_SOURCE_CHARS: usize = 3000;
/// Most recent study sessions included in a study-pattern request.
pub const MAX_RECENT_SESSIONS: usize = 10;
/// Most recent quiz scores included in a study-pattern request.
pub const MAX_RECENT_SCORES: usize = 5;

const PERSONA: &str = "You are UniAI, a smart and encouraging university tutor. ";

const TASK_BLOCK: &str = "
You are helping with one specific assignment. Use the provided context to give relevant, useful answers.
If the student asks for explanations, be detailed but clear.
If the student asks for help solving it, guide them step by step without handing over the full answer right away.
";

const GENERAL_BLOCK: &str = "
You are in a general chat for university questions.
You can help with study advice, organization, motivation, or any academic topic.
Be proactive in offering useful resources and learning strategies.
";

const CONTEXT_HEADER: &str = "\n\nADDITIONAL CONTEXT:\n";

const LEARN_BLOCK: &str =
    "\n\nLEARN MODE: Explain concepts step by step, give hints and guide the learning.";

const REVIEW_BLOCK: &str =
    "\n\nREVIEW MODE: Summarize first, then ask 3-5 questions to check understanding.";

/// Returns at most `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Builds the system prompt for a chat turn: persona, kind block, the
/// caller's context verbatim when it is not blank, then the mode block.
pub fn chat_system_prompt(kind: ChatKind, mode: ChatMode, context: &str) -> String {
    let mut prompt = String::from(PERSONA);
    prompt.push_str(match kind {
        ChatKind::Task => TASK_BLOCK,
        ChatKind::General => GENERAL_BLOCK,
    });
    if !context.trim().is_empty() {
        prompt.push_str(CONTEXT_HEADER);
        prompt.push_str(context);
    }
    prompt.push_str(match mode {
        ChatMode::Learn => LEARN_BLOCK,
        ChatMode::Review => REVIEW_BLOCK,
    });
    prompt
}

pub fn analysis_prompt(title: &str, description: &str, extracted_text: Option<&str>) -> String {
    let mut content = format!("Title: {title}\nDescription: {description}");
    if let Some(text) = extracted_text.filter(|t| !t.is_empty()) {
        content.push_str("\nFile content: ");
        content.push_str(truncate_chars(text, MAX_EXTRACTED_CHARS));
    }

    format!(
        r#"Analyze this university assignment and provide a detailed analysis:

{content}

Reply with JSON only, using exactly this structure:
{{
    "analysis": {{
        "task_type": "kind of task (homework/exam/project/etc)",
        "difficulty_level": 3,
        "estimated_time": "estimated time in hours",
        "key_concepts": ["concept1", "concept2"],
        "prerequisites": ["prerequisite1", "prerequisite2"],
        "learning_objectives": ["objective1", "objective2"]
    }},
    "explanation": {{
        "step_by_step_guide": [
            {{"step": 1, "title": "Step 1", "description": "Detailed description of step 1"}},
            {{"step": 2, "title": "Step 2", "description": "Detailed description of step 2"}}
        ],
        "tips": ["tip1", "tip2"],
        "common_mistakes": ["mistake1", "mistake2"]
    }},
    "solution": {{
        "approach": "Recommended approach",
        "key_steps": ["step1", "step2"],
        "expected_outcome": "Expected result",
        "validation_methods": ["method1", "method2"]
    }},
    "estimated_difficulty": 3,
    "suggested_approach": "Short description of the recommended approach",
    "key_concepts": ["concept1", "concept2"]
}}

Difficulty values are integers from 1 (easy) to 5 (hard).
Be specific and educational. For math tasks, show the reasoning step by step.
For essays, provide structure and writing advice."#
    )
}

pub fn quiz_prompt(subject: &str, topic: &str, difficulty: u8, count: u32) -> String {
    format!(
        r#"Generate {count} quiz questions about {topic} for the subject {subject}.
Difficulty: {difficulty}/5 (1 = easy, 5 = hard).

Reply with a JSON array only:
[
    {{
        "question": "Question text",
        "type": "multiple_choice|true_false|short_answer",
        "options": ["A) Option1", "B) Option2", "C) Option3", "D) Option4"],
        "correct_answer": "A) Option1",
        "explanation": "Short explanation of why it is correct"
    }}
]

Only multiple_choice questions carry options. Mix the question types.
For math, include step-by-step working in the explanation."#
    )
}

pub fn flashcards_prompt(content: &str, subject: &str, count: u32) -> String {
    let content = truncate_chars(content, MAX_FLASHCARD_SOURCE_CHARS);
    format!(
        r#"Analyze this material and generate {count} flashcards for studying {subject}:

MATERIAL:
{content}

Reply with a JSON array only:
[
    {{"front": "Question or key concept", "back": "Answer or detailed explanation"}}
]

Focus on important concepts, definitions, formulas and key relationships.
The cards should work well for spaced repetition."#
    )
}

fn last<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

/// Embeds the most recent sessions and quiz scores as JSON. Older entries are dropped.
pub fn study_pattern_prompt(sessions: &[Value], quiz_scores: &[Value]) -> String {
    let study_data = serde_json::json!({
        "sessions": last(sessions, MAX_RECENT_SESSIONS),
        "quiz_scores": last(quiz_scores, MAX_RECENT_SCORES),
    });
    format!(
        r#"Analyze this study data and give recommendations:

{study_data}

Reply with JSON only:
{{
    "strengths": ["strength1", "strength2"],
    "weaknesses": ["weakness1", "weakness2"],
    "recommendations": ["recommendation1", "recommendation2"],
    "optimal_study_time": "best time of day to study",
    "suggested_session_duration": "recommended session length",
    "study_streak_maintenance": "how to keep the study streak going"
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_appears_verbatim() {
        let context = "Task: Lab 3\n  Due: Friday {not a placeholder}";
        for kind in [ChatKind::Task, ChatKind::General] {
            for mode in [ChatMode::Learn, ChatMode::Review] {
                let prompt = chat_system_prompt(kind, mode, context);
                assert!(prompt.contains(context));
                assert!(prompt.contains("ADDITIONAL CONTEXT"));
            }
        }
    }

    #[test]
    fn test_blank_context_is_omitted() {
        let prompt = chat_system_prompt(ChatKind::General, ChatMode::Learn, "   \n ");
        assert!(!prompt.contains("ADDITIONAL CONTEXT"));
    }

    #[test]
    fn test_blocks_follow_kind_and_mode() {
        let task_review = chat_system_prompt(ChatKind::Task, ChatMode::Review, "");
        assert!(task_review.starts_with(PERSONA));
        assert!(task_review.contains("one specific assignment"));
        assert!(task_review.ends_with(REVIEW_BLOCK));

        let general_learn = chat_system_prompt(ChatKind::General, ChatMode::Learn, "");
        assert!(general_learn.contains("general chat"));
        assert!(general_learn.ends_with(LEARN_BLOCK));
    }

    #[test]
    fn test_context_precedes_mode_block() {
        let prompt = chat_system_prompt(ChatKind::Task, ChatMode::Learn, "CTX");
        let ctx_at = prompt.find("CTX").unwrap();
        let mode_at = prompt.find("LEARN MODE").unwrap();
        assert!(ctx_at < mode_at);
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_analysis_prompt_truncates_extracted_text() {
        let text = "x".repeat(MAX_EXTRACTED_CHARS + 500);
        let prompt = analysis_prompt("Essay", "Write about Rome", Some(&text));
        assert!(prompt.contains(&"x".repeat(MAX_EXTRACTED_CHARS)));
        assert!(!prompt.contains(&"x".repeat(MAX_EXTRACTED_CHARS + 1)));
        assert!(prompt.contains("Title: Essay"));
    }

    #[test]
    fn test_study_pattern_prompt_keeps_most_recent_entries() {
        let sessions: Vec<Value> = (0..15).map(|i| serde_json::json!({ "session": i })).collect();
        let scores: Vec<Value> = (0..8).map(|i| serde_json::json!({ "score": i })).collect();

        let prompt = study_pattern_prompt(&sessions, &scores);

        assert!(!prompt.contains(r#"{"session":4}"#));
        assert!(prompt.contains(r#"{"session":5}"#));
        assert!(prompt.contains(r#"{"session":14}"#));
        assert!(!prompt.contains(r#"{"score":2}"#));
        assert!(prompt.contains(r#"{"score":3}"#));
        assert!(prompt.contains("study_streak_maintenance"));
    }

    #[test]
    fn test_study_pattern_prompt_with_no_history() {
        let prompt = study_pattern_prompt(&[], &[]);
        assert!(prompt.contains(r#""sessions":[]"#));
    }

    #[test]
    fn test_analysis_prompt_without_text() {
        let prompt = analysis_prompt("Essay", "", None);
        assert!(!prompt.contains("File content"));
    }
}
