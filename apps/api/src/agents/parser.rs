//! Free-text CV import agent — extracts a structured resume document from the
//! plain text of an uploaded CV.

use serde_json::Value;

use crate::agents::{llm_failure, prompts};
use crate::diagnostics::DiagnosticSink;
use crate::errors::AppError;
use crate::llm_client::extract::extract_document;
use crate::llm_client::prompts::JSON_ONLY_REMINDER;
use crate::llm_client::retry::{invoke_with_retry, RetryPolicy};
use crate::llm_client::{Content, Part, TextGenerator};

/// Parses raw CV text into the standard resume document shape.
pub async fn parse_cv_content(
    llm: &dyn TextGenerator,
    diagnostics: &DiagnosticSink,
    policy: &RetryPolicy,
    content: &str,
) -> Result<Value, AppError> {
    let prompt = prompts::PARSER_PROMPT.replace("{json_only}", JSON_ONLY_REMINDER);

    let contents = vec![Content::user(vec![
        Part::text(prompt),
        Part::text(format!("CV CONTENT:\n\n{content}")),
    ])];

    let response = invoke_with_retry(policy, diagnostics, "parse_cv", || {
        llm.generate(&contents, None)
    })
    .await
    .map_err(|e| llm_failure("CV parsing", e))?;

    let raw = response.text().unwrap_or_default();
    Ok(extract_document(raw, diagnostics))
}
