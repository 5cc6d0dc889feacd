// src/ai/parse.rs

//! Best-effort recovery of JSON from free-form model output.

use serde::de::DeserializeOwned;

/// Parses `text` as `T`, tolerating the wrappers models like to add.
///
/// Tried in order: the whole trimmed text, the body of the first fenced code
/// block, the outermost `{...}` span and the outermost `[...]` span. The error
/// of the first attempt is returned when nothing parses.
pub fn parse_loose<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    let trimmed = text.trim();
    let first_error = match serde_json::from_str(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let candidates = [
        fenced_block(trimmed),
        delimited_span(trimmed, '{', '}'),
        delimited_span(trimmed, '[', ']'),
    ];
    for candidate in candidates.into_iter().flatten() {
        if let Ok(value) = serde_json::from_str(candidate) {
            return Ok(value);
        }
    }
    Err(first_error)
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")? + 3;
    let after = &text[start..];
    // Skip an info string such as `json`.
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

fn delimited_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}
