mod agents;
mod chat;
mod config;
mod diagnostics;
mod errors;
mod import;
mod llm_client;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::ChatStore;
use crate::config::Config;
use crate::diagnostics::DiagnosticSink;
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (aborts on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CVAgent API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = GeminiClient::new(config.google_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Diagnostic sink for terminal retry and parse failures
    let diagnostics = DiagnosticSink::new(config.diagnostic_log.clone());
    info!("Diagnostic sink: {}", diagnostics.path().display());

    // Conversation store shared by all sessions for the life of the process
    let chat = Arc::new(ChatStore::new());

    // Build app state
    let state = AppState {
        llm,
        chat,
        diagnostics,
        retry_policy: RetryPolicy::default(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
