pub mod handlers;
pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::errors::AppError;
use crate::state::AppState;

async fn not_implemented() -> Result<(), AppError> {
    Err(AppError::NotImplemented)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Agent operations
        .route("/api/v1/cv/analyze", post(handlers::handle_analyze))
        .route("/api/v1/cv/refine", post(handlers::handle_refine))
        .route("/api/v1/cv/reorder", post(handlers::handle_reorder))
        .route("/api/v1/cv/import", post(handlers::handle_import))
        // Session observability
        .route(
            "/api/v1/sessions/:id/history",
            get(handlers::handle_session_history),
        )
        .route(
            "/api/v1/sessions/:id/turns",
            get(handlers::handle_session_turns),
        )
        .route(
            "/api/v1/sessions/:id/stats",
            get(handlers::handle_session_stats),
        )
        .route(
            "/api/v1/sessions/:id/export",
            get(handlers::handle_session_export),
        )
        .route(
            "/api/v1/sessions/:id/import",
            post(handlers::handle_session_import),
        )
        .route("/api/v1/sessions/:id", delete(handlers::handle_session_clear))
        // PDF rendering stays with the external render service
        .route("/api/v1/render/:job_id", get(not_implemented))
        .with_state(state)
}
