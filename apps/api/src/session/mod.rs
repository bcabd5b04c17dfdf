//! Session coordination — binds a caller-supplied or freshly minted session id
//! to conversation-store bookkeeping around each mutating agent operation
//! (build, edit, reorder).
//!
//! Per operation: append a user-role message describing the request, invoke
//! the agent, and on success append an assistant-role message summarizing the
//! outcome. On failure no assistant message is appended — the session reflects
//! only completed turns — and the error surfaces with the session id still
//! attached so the conversation remains resumable.

use std::future::Future;

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::chat::{ChatStore, MessageType, Role};
use crate::errors::AppError;

/// Typed projection of the few document fields this core inspects itself.
/// Everything else in a structured document stays opaque, preserving forward
/// compatibility with agent-introduced fields.
#[derive(Debug, Default, Deserialize)]
pub struct KnownFields {
    #[serde(rename = "_reasoning")]
    pub reasoning: Option<String>,
}

impl KnownFields {
    pub fn of(document: &Value) -> Self {
        serde_json::from_value(document.clone()).unwrap_or_default()
    }
}

/// One message to record in the conversation log.
#[derive(Debug, Clone)]
pub struct TurnRecord {
    pub content: String,
    pub message_type: MessageType,
    pub metadata: Map<String, Value>,
}

impl TurnRecord {
    pub fn new(content: impl Into<String>, message_type: MessageType) -> Self {
        Self {
            content: content.into(),
            message_type,
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// An operation failure with the resolved session id attached.
#[derive(Debug)]
pub struct SessionedError {
    pub session_id: String,
    pub error: AppError,
}

impl IntoResponse for SessionedError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.error.response_parts();
        let body = Json(json!({
            "session_id": self.session_id,
            "error": {
                "code": code,
                "message": message
            }
        }));
        (status, body).into_response()
    }
}

/// Coordinates one agent operation against the conversation store.
pub struct SessionCoordinator<'a> {
    chat: &'a ChatStore,
}

impl<'a> SessionCoordinator<'a> {
    pub fn new(chat: &'a ChatStore) -> Self {
        Self { chat }
    }

    /// A caller-supplied id is reused only if the store already knows it;
    /// anything else gets a freshly minted opaque id and a new session.
    pub fn resolve(&self, requested: Option<&str>) -> String {
        match requested {
            Some(id) if self.chat.contains(id) => id.to_string(),
            _ => {
                let id = Uuid::new_v4().to_string();
                self.chat.create(&id);
                id
            }
        }
    }

    /// Runs `op` inside session bookkeeping. `op` receives the resolved
    /// session id so it can pull transcript context from the store;
    /// `summarize` produces the assistant-role record from a successful result.
    pub async fn run<T, F, Fut, S>(
        &self,
        requested: Option<&str>,
        user_turn: TurnRecord,
        op: F,
        summarize: S,
    ) -> Result<(String, T), SessionedError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
        S: FnOnce(&T) -> TurnRecord,
    {
        let session_id = self.resolve(requested);

        self.chat.append(
            &session_id,
            Role::User,
            user_turn.content,
            user_turn.message_type,
            user_turn.metadata,
        );

        match op(session_id.clone()).await {
            Ok(result) => {
                let assistant_turn = summarize(&result);
                self.chat.append(
                    &session_id,
                    Role::Assistant,
                    assistant_turn.content,
                    assistant_turn.message_type,
                    assistant_turn.metadata,
                );
                Ok((session_id, result))
            }
            Err(error) => Err(SessionedError { session_id, error }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit_turn(request: &str) -> TurnRecord {
        TurnRecord::new(request, MessageType::Edit).with_metadata("action", json!("refine"))
    }

    #[tokio::test]
    async fn test_successful_operation_appends_user_and_assistant() {
        let chat = ChatStore::new();
        let coordinator = SessionCoordinator::new(&chat);

        let (session_id, _) = coordinator
            .run(
                None,
                edit_turn("make it shorter"),
                |_sid| async { Ok(json!({"resume_data": {}})) },
                |_| TurnRecord::new("Resume updated", MessageType::Edit),
            )
            .await
            .unwrap();

        assert_eq!(chat.message_count(&session_id), 2);
        let history = chat.history(&session_id);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_two_edits_on_same_session_add_two_messages_each() {
        let chat = ChatStore::new();
        let coordinator = SessionCoordinator::new(&chat);

        let (session_id, _) = coordinator
            .run(
                None,
                edit_turn("first edit"),
                |_sid| async { Ok(json!({})) },
                |_| TurnRecord::new("done", MessageType::Edit),
            )
            .await
            .unwrap();
        assert_eq!(chat.message_count(&session_id), 2);

        let (resumed_id, _) = coordinator
            .run(
                Some(&session_id),
                edit_turn("second edit"),
                |_sid| async { Ok(json!({})) },
                |_| TurnRecord::new("done again", MessageType::Edit),
            )
            .await
            .unwrap();

        assert_eq!(resumed_id, session_id);
        assert_eq!(chat.message_count(&session_id), 4);
    }

    #[tokio::test]
    async fn test_failed_operation_appends_user_only_and_keeps_session_id() {
        let chat = ChatStore::new();
        let coordinator = SessionCoordinator::new(&chat);

        let err = coordinator
            .run(
                None,
                edit_turn("doomed edit"),
                |_sid| async {
                    Err::<Value, _>(AppError::Llm("exhausted".to_string()))
                },
                |_| TurnRecord::new("unreachable", MessageType::Edit),
            )
            .await
            .unwrap_err();

        assert_eq!(chat.message_count(&err.session_id), 1);
        assert_eq!(chat.history(&err.session_id)[0].role, Role::User);
        assert!(matches!(err.error, AppError::Llm(_)));
    }

    #[tokio::test]
    async fn test_unknown_supplied_id_gets_a_fresh_session() {
        let chat = ChatStore::new();
        let coordinator = SessionCoordinator::new(&chat);

        let (session_id, _) = coordinator
            .run(
                Some("never-seen-before"),
                edit_turn("edit"),
                |_sid| async { Ok(json!({})) },
                |_| TurnRecord::new("done", MessageType::Edit),
            )
            .await
            .unwrap();

        assert_ne!(session_id, "never-seen-before");
        assert!(chat.contains(&session_id));
    }

    #[tokio::test]
    async fn test_op_receives_resolved_session_id() {
        let chat = ChatStore::new();
        let coordinator = SessionCoordinator::new(&chat);

        let (session_id, seen) = coordinator
            .run(
                None,
                edit_turn("edit"),
                |sid| async move { Ok::<_, AppError>(sid) },
                |_| TurnRecord::new("done", MessageType::Edit),
            )
            .await
            .unwrap();

        assert_eq!(seen, session_id);
    }

    #[test]
    fn test_known_fields_reads_reasoning() {
        let doc = json!({"resume_data": {}, "_reasoning": "Tightened the summary"});
        assert_eq!(
            KnownFields::of(&doc).reasoning.as_deref(),
            Some("Tightened the summary")
        );
        assert_eq!(KnownFields::of(&json!({"resume_data": {}})).reasoning, None);
    }
}
