//! Request handlers for the agent operations and the session endpoints.
//!
//! The three mutating operations (analyze, refine, reorder) run through the
//! session coordinator: a user-role message before the agent call, an
//! assistant-role message after it, and the resolved session id echoed back
//! so the caller can resume the conversation. Import is a one-shot parse and
//! carries no session bookkeeping.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::agents::{analysis, editor, layout, parser};
use crate::chat::{ChatMessage, ChatTurn, MessageType};
use crate::errors::AppError;
use crate::import::extract_upload_text;
use crate::session::{KnownFields, SessionCoordinator, SessionedError, TurnRecord};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Analyze (build)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Template image as a `data:` URI or bare base64 PNG.
    pub template_image: String,
    #[serde(default)]
    pub query: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub session_id: String,
    pub document: Value,
}

/// POST /api/v1/cv/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, SessionedError> {
    let AnalyzeRequest {
        template_image,
        query,
        session_id,
    } = req;

    let coordinator = SessionCoordinator::new(&state.chat);
    let user_turn = TurnRecord::new(
        format!("Analyze CV template (style query: {query})"),
        MessageType::Build,
    )
    .with_metadata("action", json!("analyze_template"))
    .with_metadata("search_query", json!(query));

    let (session_id, document) = coordinator
        .run(
            session_id.as_deref(),
            user_turn,
            |_sid| {
                analysis::analyze_template(
                    &state.llm,
                    &state.diagnostics,
                    &state.retry_policy,
                    &template_image,
                    &query,
                )
            },
            |document| {
                let content = KnownFields::of(document).reasoning.unwrap_or_else(|| {
                    "Generated CV template analysis and form schema".to_string()
                });
                TurnRecord::new(content, MessageType::Build)
                    .with_metadata("action", json!("analyze_template"))
            },
        )
        .await?;

    Ok(Json(AnalyzeResponse {
        session_id,
        document,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Refine (edit)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RefineRequest {
    pub resume_data: Value,
    pub user_request: String,
    /// Optional screenshot of the rendered page for visual context.
    pub image_base64: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefineResponse {
    pub session_id: String,
    pub resume_data: Value,
}

/// POST /api/v1/cv/refine
pub async fn handle_refine(
    State(state): State<AppState>,
    Json(req): Json<RefineRequest>,
) -> Result<Json<RefineResponse>, SessionedError> {
    let RefineRequest {
        resume_data,
        user_request,
        image_base64,
        session_id,
    } = req;

    let coordinator = SessionCoordinator::new(&state.chat);

    // Resolve eagerly so the transcript handed to the agent reflects the
    // session being resumed (resolve is idempotent for a known id).
    let session_id = coordinator.resolve(session_id.as_deref());
    let history_context = state.chat.format_for_prompt(&session_id, Some(10), true);

    let user_turn = TurnRecord::new(user_request.clone(), MessageType::Edit)
        .with_metadata("action", json!("refine"));

    let (session_id, updated) = coordinator
        .run(
            Some(&session_id),
            user_turn,
            |_sid| {
                editor::refine_resume_data(
                    &state.llm,
                    &state.diagnostics,
                    &state.retry_policy,
                    &resume_data,
                    &user_request,
                    image_base64.as_deref(),
                    &history_context,
                )
            },
            |updated| {
                let content = KnownFields::of(updated)
                    .reasoning
                    .unwrap_or_else(|| "Resume data updated".to_string());
                TurnRecord::new(content, MessageType::Edit)
                    .with_metadata("action", json!("refine"))
            },
        )
        .await?;

    Ok(Json(RefineResponse {
        session_id,
        resume_data: updated,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Reorder (layout)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub html: String,
    pub order: Vec<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    pub session_id: String,
    pub html: String,
}

/// POST /api/v1/cv/reorder
pub async fn handle_reorder(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>, SessionedError> {
    let ReorderRequest {
        html,
        order,
        session_id,
    } = req;

    let coordinator = SessionCoordinator::new(&state.chat);
    let user_turn = TurnRecord::new(
        format!("Reorder sections: {}", order.join(", ")),
        MessageType::Rearrange,
    )
    .with_metadata("action", json!("reorder_sections"))
    .with_metadata("sections_reordered", json!(order));

    let (session_id, html) = coordinator
        .run(
            session_id.as_deref(),
            user_turn,
            |_sid| {
                layout::reorder_sections(
                    &state.llm,
                    &state.diagnostics,
                    &state.retry_policy,
                    &html,
                    &order,
                )
            },
            |_| {
                TurnRecord::new("Sections reordered successfully", MessageType::Rearrange)
                    .with_metadata("action", json!("reorder_sections"))
                    .with_metadata("sections_reordered", json!(order))
            },
        )
        .await?;

    Ok(Json(ReorderResponse { session_id, html }))
}

// ────────────────────────────────────────────────────────────────────────────
// Import
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub resume_data: Value,
}

/// POST /api/v1/cv/import
/// Multipart upload: a single `file` field (PDF or text). One-shot — no
/// session bookkeeping.
pub async fn handle_import(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.txt").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        let content = extract_upload_text(&filename, &data)?;
        let resume_data = parser::parse_cv_content(
            &state.llm,
            &state.diagnostics,
            &state.retry_policy,
            &content,
        )
        .await?;

        return Ok(Json(ImportResponse { resume_data }));
    }

    Err(AppError::Validation(
        "Missing 'file' field in multipart body".to_string(),
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Sessions
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/sessions/:id/history
/// Unknown session ids yield an empty history, not an error.
pub async fn handle_session_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Vec<ChatMessage>> {
    Json(state.chat.history(&id))
}

/// GET /api/v1/sessions/:id/turns
/// History in provider chat-turn format (`user` / `model` roles).
pub async fn handle_session_turns(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Vec<ChatTurn>> {
    Json(state.chat.format_for_chat_turns(&id, None))
}

#[derive(Debug, Serialize)]
pub struct SessionStats {
    pub session_id: String,
    pub message_count: usize,
}

/// GET /api/v1/sessions/:id/stats
pub async fn handle_session_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<SessionStats> {
    let message_count = state.chat.message_count(&id);
    Json(SessionStats {
        session_id: id,
        message_count,
    })
}

/// GET /api/v1/sessions/:id/export
pub async fn handle_session_export(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.chat.export_session(&id),
    )
}

/// POST /api/v1/sessions/:id/import
/// Replaces a session's history wholesale from a previous export.
pub async fn handle_session_import(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> Result<StatusCode, AppError> {
    state
        .chat
        .import_session(&id, &body)
        .map_err(|e| AppError::Validation(format!("Malformed session export: {e}")))?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/sessions/:id — idempotent.
pub async fn handle_session_clear(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    state.chat.clear(&id);
    StatusCode::NO_CONTENT
}
