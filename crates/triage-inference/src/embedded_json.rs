//! Extraction of a JSON object embedded in model output.
//!
//! Models wrap JSON in a fenced block most of the time and in prose some of
//! the time. The fenced block wins; otherwise the span from the first `{` to
//! the last `}` is tried. Unlike labeled-section parsing this fails loudly,
//! because there is no meaningful partial JSON to fall back to.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use triage_core::{Error, Result};

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("valid regex"));

/// The JSON object text inside `text`, if any.
pub fn extract_json_block(text: &str) -> Option<&str> {
    if let Some(m) = FENCED_JSON.captures(text).and_then(|c| c.get(1)) {
        return Some(m.as_str());
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse the embedded JSON object, failing with [`Error::Parse`].
pub fn parse_json_object(text: &str) -> Result<Map<String, Value>> {
    let block = extract_json_block(text).ok_or_else(|| {
        Error::Parse("Failed to parse LLM response: no JSON object found".to_string())
    })?;
    match serde_json::from_str::<Value>(block) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::Parse(
            "Failed to parse LLM response: JSON is not an object".to_string(),
        )),
        Err(e) => Err(Error::Parse(format!(
            "Failed to parse LLM response: {}",
            e
        ))),
    }
}
