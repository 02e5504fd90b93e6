use crate::utils::error::{AushadhError, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// First `{` to last `}`, across newlines.
fn json_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
}

/// Parses model output as JSON, recovering the object from prose or
/// markdown fences when the model ignored the JSON response type.
pub fn parse_model_json(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Err(AushadhError::EmptyResponse);
    }

    let first_error = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    tracing::debug!("Direct JSON parse failed ({}), trying block extraction", first_error);

    let block = json_block()
        .find(text)
        .ok_or_else(|| AushadhError::ResponseParseError {
            message: format!("no JSON object found in model output ({})", first_error),
        })?;

    serde_json::from_str(block.as_str()).map_err(|e| AushadhError::ResponseParseError {
        message: format!("extracted block is not valid JSON: {}", e),
    })
}
