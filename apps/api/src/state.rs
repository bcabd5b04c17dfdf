use std::sync::Arc;

use crate::chat::ChatStore;
use crate::diagnostics::DiagnosticSink;
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::GeminiClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: GeminiClient,
    /// One conversation store per running process, explicitly owned here
    /// rather than hidden behind a global.
    pub chat: Arc<ChatStore>,
    pub diagnostics: DiagnosticSink,
    pub retry_policy: RetryPolicy,
}
