//! Structured extraction — turns best-effort model text into a JSON object,
//! tolerant of the formatting mistakes generative output routinely makes.
//!
//! Cleanup order (each step a no-op when its pattern is absent):
//! 1. content of the first ```json fenced block, if any;
//! 2. else content of the first fenced block of any tag;
//! 3. slice from the first `{` to the last `}` — strips prose the model adds
//!    around (or inside) fences. NOTE: deliberately greedy. A response with
//!    multiple sibling JSON objects in prose slices to the outermost span and
//!    usually fails to parse; that routes to the fallback. Known sharp edge,
//!    kept simple on purpose.
//! 4. remove trailing commas before `}` / `]`;
//! 5. parse.
//!
//! Extraction failure is never fatal: the caller always receives a JSON
//! object, falling back to [`fallback::safe_default`] after recording a
//! parse diagnostic.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::diagnostics::DiagnosticSink;
use crate::llm_client::fallback;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?(.*?)```").expect("valid fence regex"));

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([\]}])").expect("valid trailing-comma regex"));

/// Applies cleanup steps 1–4. Exposed separately so idempotence is testable.
pub fn clean_response_text(raw: &str) -> String {
    let mut text: &str = raw;

    // 1. Content of the first ```json block (unterminated fence: rest of text).
    if let Some(idx) = text.find("```json") {
        let after = &text[idx + "```json".len()..];
        text = match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        };
    } else if text.contains("```") {
        // 2. First fenced block of any tag.
        if let Some(caps) = FENCED_BLOCK.captures(text) {
            text = caps.get(1).map(|m| m.as_str()).unwrap_or(text);
        }
    }

    // 3. Slice to the outermost first-`{`/last-`}` span, when both exist.
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            text = &text[start..=end];
        }
    }

    // 4. Trailing commas before closing braces/brackets are a frequent and
    //    otherwise-fatal generator mistake.
    TRAILING_COMMA.replace_all(text, "$1").into_owned()
}

/// Parses the cleaned text, enforcing the one invariant this layer guarantees:
/// the top-level value is a JSON object.
fn parse_object(cleaned: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(cleaned) {
        Ok(value) if value.is_object() => Ok(value),
        Ok(other) => Err(format!(
            "top-level value is not a JSON object (got {})",
            type_name(&other)
        )),
        Err(e) => Err(e.to_string()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Cleans and parses `raw` into a JSON object. On failure, records a parse
/// diagnostic (error, cleaned text, original text) and returns the safe
/// default document — callers never branch on malformed output.
pub fn extract_document(raw: &str, diagnostics: &DiagnosticSink) -> Value {
    let cleaned = clean_response_text(raw);
    match parse_object(&cleaned) {
        Ok(value) => value,
        Err(parse_error) => {
            warn!("Failed to parse agent response as JSON object: {parse_error}; returning safe fallback");
            diagnostics.record_parse_failure(&parse_error, &cleaned, raw);
            fallback::safe_default()
        }
    }
}
