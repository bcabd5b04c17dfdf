//! Data-editing (refine) agent — modifies the resume document from a natural
//! language request, optionally grounded by a page screenshot and by the
//! session's conversation transcript.

use serde_json::Value;

use crate::agents::{llm_failure, prompts, split_image_payload};
use crate::diagnostics::DiagnosticSink;
use crate::errors::AppError;
use crate::llm_client::extract::extract_document;
use crate::llm_client::retry::{invoke_with_retry, RetryPolicy};
use crate::llm_client::{Content, GenerationConfig, Part, TextGenerator};

/// Applies `user_request` to `current_data`. `history_context` is the
/// formatted transcript from the conversation store (may be the empty-history
/// placeholder); `image_base64` is an optional screenshot of the rendered page.
pub async fn refine_resume_data(
    llm: &dyn TextGenerator,
    diagnostics: &DiagnosticSink,
    policy: &RetryPolicy,
    current_data: &Value,
    user_request: &str,
    image_base64: Option<&str>,
    history_context: &str,
) -> Result<Value, AppError> {
    // Placeholder replacement, not format!: the resume JSON is full of braces.
    let prompt = prompts::EDITOR_PROMPT
        .replace("{user_request}", user_request)
        .replace("{history_context}", history_context);
    let full_prompt = format!(
        "{prompt}\n{}",
        serde_json::to_string_pretty(current_data)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize resume data: {e}")))?
    );

    let mut parts = Vec::new();
    if let Some(image) = image_base64 {
        let (mime_type, data) = split_image_payload(image)?;
        parts.push(Part::inline_data(mime_type, data));
    }
    parts.push(Part::text(full_prompt));
    let contents = vec![Content::user(parts)];

    let config = GenerationConfig {
        response_mime_type: Some("application/json".to_string()),
        ..Default::default()
    };

    let response = invoke_with_retry(policy, diagnostics, "refine_resume", || {
        llm.generate(&contents, Some(&config))
    })
    .await
    .map_err(|e| llm_failure("Resume refinement", e))?;

    let raw = response.text().unwrap_or_default();
    Ok(extract_document(raw, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{empty_response, text_response, ScriptedGenerator};
    use serde_json::json;

    fn sink() -> (tempfile::TempDir, DiagnosticSink) {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiagnosticSink::new(dir.path().join("error.log"));
        (dir, sink)
    }

    #[tokio::test]
    async fn test_refine_returns_updated_document_with_reasoning() {
        let (_dir, diagnostics) = sink();
        let llm = ScriptedGenerator::new(vec![Ok(text_response(
            r#"{"basics": {"name": "Ada"}, "_reasoning": "Shortened the summary"}"#,
        ))]);

        let updated = refine_resume_data(
            &llm,
            &diagnostics,
            &RetryPolicy::default(),
            &json!({"basics": {"name": "Ada Lovelace"}}),
            "shorten my summary",
            None,
            "No previous conversation history.",
        )
        .await
        .unwrap();

        assert_eq!(updated["basics"]["name"], "Ada");
        assert_eq!(updated["_reasoning"], "Shortened the summary");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_then_valid_response_is_retried_transparently() {
        let (_dir, diagnostics) = sink();
        let llm = ScriptedGenerator::new(vec![
            Ok(empty_response()),
            Ok(text_response(r#"{"basics": {}}"#)),
        ]);

        let updated = refine_resume_data(
            &llm,
            &diagnostics,
            &RetryPolicy::default(),
            &json!({}),
            "add a skills section",
            None,
            "No previous conversation history.",
        )
        .await
        .unwrap();

        assert!(updated["basics"].is_object());
    }

    #[tokio::test]
    async fn test_screenshot_is_rejected_when_not_base64() {
        let (_dir, diagnostics) = sink();
        let llm = ScriptedGenerator::new(vec![]);

        let err = refine_resume_data(
            &llm,
            &diagnostics,
            &RetryPolicy::default(),
            &json!({}),
            "fill the empty space",
            Some("!!definitely not base64!!"),
            "No previous conversation history.",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }
}
