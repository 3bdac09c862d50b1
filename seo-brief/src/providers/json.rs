//! JSON extraction from model replies.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Extract JSON content from markdown code blocks or surrounding prose
///
/// Handles:
/// - ```json blocks
/// - Generic ``` blocks
/// - Raw JSON, with any prose before the first `{` or after the last `}` dropped
pub fn extract_json(text: &str) -> String {
    if let Some(body) = fenced(text, "```json").or_else(|| fenced(text, "```")) {
        return body;
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => text[start..=end].to_string(),
        _ => text.trim().to_string(),
    }
}

fn fenced(text: &str, opener: &str) -> Option<String> {
    let start = text.find(opener)? + opener.len();
    let end = text[start..]
        .rfind("```")
        .map(|pos| pos + start)
        .unwrap_or(text.len());
    Some(text[start..end].trim().to_string())
}

/// Parse a model reply into `T`, with a preview of the reply on failure
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    let json = extract_json(text);
    serde_json::from_str(&json).with_context(|| {
        format!(
            "Failed to parse JSON reply (first 300 chars): {}",
            json.chars().take(300).collect::<String>()
        )
    })
}
