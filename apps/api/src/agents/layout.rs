//! Section-reorder agent — rearranges the HTML section blocks to a target
//! order. Unlike the other agents this one returns raw HTML, so its output
//! bypasses the JSON extractor; the only validation is a truncation guard.

use crate::agents::{llm_failure, prompts};
use crate::diagnostics::DiagnosticSink;
use crate::errors::AppError;
use crate::llm_client::prompts::PRESERVE_MUSTACHE_INSTRUCTION;
use crate::llm_client::retry::{invoke_with_retry, RetryPolicy};
use crate::llm_client::{Content, GenerationConfig, Part, TextGenerator};

/// Reorders the template's section blocks to `order`. Fails when the model
/// truncates the document (missing closing `</html>`) — a partial template
/// would corrupt the caller's rendering, so the original HTML stays in use.
pub async fn reorder_sections(
    llm: &dyn TextGenerator,
    diagnostics: &DiagnosticSink,
    policy: &RetryPolicy,
    html: &str,
    order: &[String],
) -> Result<String, AppError> {
    let order_list = order
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = prompts::REORDER_PROMPT
        .replace("{preserve_mustache}", PRESERVE_MUSTACHE_INSTRUCTION)
        .replace("{order_list}", &order_list)
        .replace("{html}", html);

    let contents = vec![Content::user(vec![Part::text(prompt)])];
    let config = GenerationConfig {
        temperature: Some(0.0), // deterministic reordering
        response_mime_type: Some("text/plain".to_string()),
    };

    let response = invoke_with_retry(policy, diagnostics, "reorder_sections", || {
        llm.generate(&contents, Some(&config))
    })
    .await
    .map_err(|e| llm_failure("Section reorder", e))?;

    let raw = response.text().unwrap_or_default();
    let clean_html = raw.replace("```html", "").replace("```", "").trim().to_string();

    if !tail_chars(&clean_html, 20).contains("</html>") {
        return Err(AppError::Llm(
            "Section reorder result was truncated".to_string(),
        ));
    }

    Ok(clean_html)
}

/// Last `n` characters of `text` (not bytes — the document may end in
/// multi-byte typography).
fn tail_chars(text: &str, n: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{text_response, ScriptedGenerator};

    const REORDERED: &str =
        "<html><body><div class=\"cv-section\">{{#skills}}{{/skills}}</div></body></html>";

    fn sink() -> (tempfile::TempDir, DiagnosticSink) {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiagnosticSink::new(dir.path().join("error.log"));
        (dir, sink)
    }

    fn order(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_reorder_strips_html_fences() {
        let (_dir, diagnostics) = sink();
        let llm = ScriptedGenerator::new(vec![Ok(text_response(&format!(
            "```html\n{REORDERED}\n```"
        )))]);

        let html = reorder_sections(
            &llm,
            &diagnostics,
            &RetryPolicy::default(),
            "<html><body></body></html>",
            &order(&["skills", "work"]),
        )
        .await
        .unwrap();

        assert_eq!(html, REORDERED);
    }

    #[tokio::test]
    async fn test_truncated_result_is_an_error() {
        let (_dir, diagnostics) = sink();
        let llm = ScriptedGenerator::new(vec![Ok(text_response(
            "<html><body><div class=\"cv-section\">half a docu",
        ))]);

        let err = reorder_sections(
            &llm,
            &diagnostics,
            &RetryPolicy::default(),
            "<html></html>",
            &order(&["work"]),
        )
        .await
        .unwrap_err();

        match err {
            AppError::Llm(msg) => assert!(msg.contains("truncated")),
            other => panic!("expected Llm error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mustache_placeholders_survive_the_round_trip() {
        let (_dir, diagnostics) = sink();
        let llm = ScriptedGenerator::new(vec![Ok(text_response(REORDERED))]);

        let html = reorder_sections(
            &llm,
            &diagnostics,
            &RetryPolicy::default(),
            REORDERED,
            &order(&["skills"]),
        )
        .await
        .unwrap();

        assert!(html.contains("{{#skills}}"));
        assert!(html.contains("{{/skills}}"));
    }
}
