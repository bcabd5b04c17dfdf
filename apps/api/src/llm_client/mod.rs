/// LLM Client — the single point of entry for all Gemini API calls in CVAgent.
///
/// ARCHITECTURAL RULE: No other module may call the Google GenAI API directly.
/// All generative interactions MUST go through this module.
///
/// Model: gemini-2.0-flash-exp (hardcoded — do not make configurable to prevent drift)
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub mod extract;
pub mod fallback;
pub mod prompts;
pub mod retry;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for all generative calls in CVAgent.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemini-2.0-flash-exp";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM call failed after {attempts} attempts: {detail}")]
    RetryExhausted { attempts: u32, detail: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types (Gemini generateContent)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64-encoded payload, without any data-URI header.
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<&'a GenerationConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<ResponseContent>,
    pub finish_reason: Option<String>,
    pub safety_ratings: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
}

/// One raw response from the generation capability.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerateResponse {
    /// Extracts the text of the first non-empty text part of the first candidate.
    /// `None` when the model produced no usable text — the retry layer treats
    /// that the same as a failed call.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| {
                content
                    .parts
                    .iter()
                    .find_map(|p| p.text.as_deref().filter(|t| !t.is_empty()))
            })
    }

    /// Finish-reason / safety summary for diagnostic records on terminal failure.
    pub fn introspection(&self) -> String {
        if self.candidates.is_empty() {
            return "no candidates".to_string();
        }
        self.candidates
            .iter()
            .map(|c| {
                format!(
                    "finish_reason={} safety_ratings={}",
                    c.finish_reason.as_deref().unwrap_or("unknown"),
                    c.safety_ratings
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "none".to_string())
                )
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Seam between the agents and the network transport. Agents call through this
/// trait so tests can substitute a scripted generator for the real API.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Performs exactly one call. Retry policy lives above this, in
    /// [`retry::invoke_with_retry`].
    async fn generate(
        &self,
        contents: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<GenerateResponse, LlmError>;
}

/// The single Gemini client used by all agents in CVAgent.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        contents: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<GenerateResponse, LlmError> {
        let request_body = GeminiRequest {
            contents,
            generation_config: config,
        };

        let url = format!("{GEMINI_API_BASE}/{MODEL}:generateContent");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse the structured error message
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let generate_response: GenerateResponse = response.json().await?;

        if let Some(usage) = &generate_response.usage_metadata {
            debug!(
                "LLM call succeeded: prompt_tokens={:?}, candidate_tokens={:?}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(generate_response)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Test support
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Returns a response whose first candidate carries the given text.
    pub fn text_response(text: &str) -> GenerateResponse {
        GenerateResponse {
            candidates: vec![Candidate {
                content: Some(ResponseContent {
                    parts: vec![ResponsePart {
                        text: Some(text.to_string()),
                    }],
                }),
                finish_reason: Some("STOP".to_string()),
                safety_ratings: None,
            }],
            usage_metadata: None,
        }
    }

    /// Returns a response with no usable text (empty candidate list).
    pub fn empty_response() -> GenerateResponse {
        GenerateResponse {
            candidates: vec![],
            usage_metadata: None,
        }
    }

    /// Scripted generator: pops one preloaded result per call.
    /// Panics if called more times than it has results — that is a test bug.
    pub struct ScriptedGenerator {
        results: Mutex<VecDeque<Result<GenerateResponse, LlmError>>>,
    }

    impl ScriptedGenerator {
        pub fn new(results: Vec<Result<GenerateResponse, LlmError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            _contents: &[Content],
            _config: Option<&GenerationConfig>,
        ) -> Result<GenerateResponse, LlmError> {
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .expect("ScriptedGenerator exhausted")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_returns_first_nonempty_part() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {"parts": [{"text": ""}, {"text": "hello"}]},
                    "finishReason": "STOP"
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(response.text(), Some("hello"));
    }

    #[test]
    fn test_text_is_none_without_candidates() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_introspection_reports_finish_reason() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {"parts": []},
                    "finishReason": "SAFETY",
                    "safetyRatings": [{"category": "HARM", "probability": "HIGH"}]
                }]
            }"#,
        )
        .unwrap();
        let info = response.introspection();
        assert!(info.contains("finish_reason=SAFETY"));
        assert!(info.contains("HARM"));
    }

    #[test]
    fn test_request_serializes_inline_data_camel_case() {
        let contents = vec![Content::user(vec![
            Part::text("describe this"),
            Part::inline_data("image/png", "QUJD"),
        ])];
        let body = GeminiRequest {
            contents: &contents,
            generation_config: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert!(json.get("generationConfig").is_none());
    }
}
