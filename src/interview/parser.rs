//! Extraction of the question object from raw model text
//!
//! Models wrap their JSON in prose or code fences often enough that the reply
//! is scanned for the first well-formed JSON object rather than parsed whole.

use serde_json::Value;

use crate::interview::error::{GenerationError, Result};
use crate::interview::types::QuestionPayload;

/// Returns the first complete JSON object embedded anywhere in `text`
pub fn extract_json_object(text: &str) -> Option<Value> {
    for (start, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        if let Some(Ok(value)) = stream.next() {
            if value.is_object() {
                return Some(value);
            }
        }
    }
    None
}

/// Parses and validates the model reply into a question payload.
///
/// Tags are trimmed, empty tags dropped, and duplicates removed while keeping
/// first-seen order.
pub fn parse_question(raw: &str) -> Result<QuestionPayload> {
    let value = extract_json_object(raw)
        .ok_or_else(|| GenerationError::validation("no JSON object found in reply", raw))?;

    let mut payload: QuestionPayload = serde_json::from_value(value).map_err(|e| {
        GenerationError::validation(format!("reply JSON has the wrong shape: {}", e), raw)
    })?;

    payload.question = payload.question.trim().to_string();
    if payload.question.is_empty() {
        return Err(GenerationError::validation("reply has an empty question", raw));
    }

    let mut tags: Vec<String> = Vec::with_capacity(payload.tags.len());
    for tag in payload.tags.drain(..) {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    payload.tags = tags;

    Ok(payload)
}
