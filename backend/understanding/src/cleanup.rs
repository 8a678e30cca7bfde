//! Model output cleanup: fence stripping and JSON parsing.

use serde_json::Value;

/// Remove every "```json" and "```" marker, then trim.
///
/// Models sometimes wrap the object in a code block despite being told not to.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Strip fences and parse what remains as JSON.
pub fn parse_model_output(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(&strip_code_fences(text))
}
