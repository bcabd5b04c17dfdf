//! Template analysis (build) agent — turns a CV template image into a complete
//! structured document: HTML template, form schema and sample resume data.

use chrono::Utc;
use serde_json::{json, Value};

use crate::agents::{llm_failure, prompts, split_image_payload};
use crate::diagnostics::DiagnosticSink;
use crate::errors::AppError;
use crate::llm_client::extract::extract_document;
use crate::llm_client::prompts::{JSON_ONLY_REMINDER, PRESERVE_MUSTACHE_INSTRUCTION};
use crate::llm_client::retry::{invoke_with_retry, RetryPolicy};
use crate::llm_client::{Content, Part, TextGenerator};

/// Analyzes a template image and returns the structured document. The image
/// arrives as a `data:` URI or bare base64. Malformed agent output degrades to
/// the safe fallback document, never to an error; only retry exhaustion fails.
pub async fn analyze_template(
    llm: &dyn TextGenerator,
    diagnostics: &DiagnosticSink,
    policy: &RetryPolicy,
    template_image: &str,
    search_query: &str,
) -> Result<Value, AppError> {
    let (mime_type, image_data) = split_image_payload(template_image)?;

    let prompt = prompts::ANALYSIS_PROMPT
        .replace("{preserve_mustache}", PRESERVE_MUSTACHE_INSTRUCTION)
        .replace("{json_only}", JSON_ONLY_REMINDER);

    let contents = vec![Content::user(vec![
        Part::text(prompt),
        Part::inline_data(mime_type, image_data),
    ])];

    let response = invoke_with_retry(policy, diagnostics, "analyze_template", || {
        llm.generate(&contents, None)
    })
    .await
    .map_err(|e| llm_failure("Template analysis", e))?;

    let raw = response.text().unwrap_or_default();
    let mut document = extract_document(raw, diagnostics);

    if let Some(map) = document.as_object_mut() {
        map.insert(
            "_meta".to_string(),
            json!({
                "discovery": {
                    "source": "selected",
                    "search_query": search_query,
                },
                "analyzed_at": Utc::now().to_rfc3339(),
            }),
        );
    }

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{text_response, ScriptedGenerator};
    use crate::llm_client::{fallback, LlmError};

    fn sink() -> (tempfile::TempDir, DiagnosticSink) {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiagnosticSink::new(dir.path().join("error.log"));
        (dir, sink)
    }

    #[tokio::test]
    async fn test_fenced_response_parses_and_is_stamped_with_meta() {
        let (_dir, diagnostics) = sink();
        let llm = ScriptedGenerator::new(vec![Ok(text_response(
            "```json\n{\"html_template\": \"<div/>\", \"form_schema\": {}, \"resume_data\": {}}\n```",
        ))]);

        let document = analyze_template(
            &llm,
            &diagnostics,
            &RetryPolicy::default(),
            "data:image/png;base64,QUJD",
            "minimalist",
        )
        .await
        .unwrap();

        assert_eq!(document["html_template"], "<div/>");
        assert_eq!(document["_meta"]["discovery"]["search_query"], "minimalist");
        assert!(document["_meta"]["analyzed_at"].is_string());
    }

    #[tokio::test]
    async fn test_unparseable_response_degrades_to_fallback() {
        let (_dir, diagnostics) = sink();
        let llm = ScriptedGenerator::new(vec![Ok(text_response("no json here at all"))]);

        let document = analyze_template(
            &llm,
            &diagnostics,
            &RetryPolicy::default(),
            "QUJD",
            "modern",
        )
        .await
        .unwrap();

        // Fallback document, still stamped with _meta.
        assert_eq!(
            document["resume_data"],
            fallback::safe_default()["resume_data"]
        );
        assert!(document["_meta"].is_object());
    }

    #[tokio::test]
    async fn test_invalid_image_payload_is_rejected_before_any_call() {
        let (_dir, diagnostics) = sink();
        // Zero scripted results: a call would panic the generator.
        let llm = ScriptedGenerator::new(vec![]);

        let err = analyze_template(
            &llm,
            &diagnostics,
            &RetryPolicy::default(),
            "data:image/png;base64,@@not-base64@@",
            "modern",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhaustion_surfaces_as_llm_error() {
        let (_dir, diagnostics) = sink();
        let llm = ScriptedGenerator::new(vec![
            Err(LlmError::Api {
                status: 503,
                message: "overloaded".to_string(),
            }),
            Err(LlmError::Api {
                status: 503,
                message: "overloaded".to_string(),
            }),
            Err(LlmError::Api {
                status: 503,
                message: "overloaded".to_string(),
            }),
        ]);

        let err = analyze_template(&llm, &diagnostics, &RetryPolicy::default(), "QUJD", "q")
            .await
            .unwrap_err();

        match err {
            AppError::Llm(msg) => assert!(msg.contains("after 3 attempts")),
            other => panic!("expected Llm error, got {other:?}"),
        }
    }
}
