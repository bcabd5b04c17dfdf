//! Session-keyed, append-only conversation store.
//!
//! All mutation is in-memory and process-wide. A session key, once created,
//! always resolves to the same message sequence for the life of the process —
//! no silent reset. Concurrent writers to one session id are an accepted
//! non-goal: the mutex serializes appends in arrival order and nothing more.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::chat::message::{ChatMessage, MessageType, Role};

/// Content truncation bound applied when formatting transcripts, to keep
/// prompt context compact.
const TRANSCRIPT_CONTENT_LIMIT: usize = 500;

/// One turn in the provider chat format: `user` / `model` roles with text parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub role: String,
    pub parts: Vec<TurnPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnPart {
    pub text: String,
}

/// In-memory conversation store keyed by opaque session id.
#[derive(Default)]
pub struct ChatStore {
    sessions: Mutex<HashMap<String, Vec<ChatMessage>>>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes a session. Idempotent: an existing session keeps its history.
    pub fn create(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().expect("chat store poisoned");
        sessions.entry(session_id.to_string()).or_default();
    }

    /// Appends a message, creating the session if absent. The message is
    /// stamped with the current time.
    pub fn append(
        &self,
        session_id: &str,
        role: Role,
        content: impl Into<String>,
        message_type: MessageType,
        metadata: Map<String, Value>,
    ) {
        let message = ChatMessage::new(role, content, message_type, metadata);
        let mut sessions = self.sessions.lock().expect("chat store poisoned");
        sessions
            .entry(session_id.to_string())
            .or_default()
            .push(message);
    }

    /// Full ordered history. Unknown session yields an empty sequence, not an error.
    pub fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        let sessions = self.sessions.lock().expect("chat store poisoned");
        sessions.get(session_id).cloned().unwrap_or_default()
    }

    /// Returns true if the session id is already known to the store.
    pub fn contains(&self, session_id: &str) -> bool {
        let sessions = self.sessions.lock().expect("chat store poisoned");
        sessions.contains_key(session_id)
    }

    /// Formats history as readable prompt context.
    ///
    /// System messages are filtered out BEFORE the window is applied when
    /// `include_system` is false — filtering changes which messages count
    /// toward the cap, and callers depend on that truncation boundary.
    /// `max_messages` takes the most recent N (a suffix, never a sample).
    pub fn format_for_prompt(
        &self,
        session_id: &str,
        max_messages: Option<usize>,
        include_system: bool,
    ) -> String {
        let mut messages = self.history(session_id);

        if !include_system {
            messages.retain(|m| m.role != Role::System);
        }
        let messages = apply_window(&messages, max_messages);

        if messages.is_empty() {
            return "No previous conversation history.".to_string();
        }

        let mut lines = vec![
            "Previous conversation context:".to_string(),
            "=".repeat(50),
        ];

        for msg in messages {
            let header = if msg.message_type == MessageType::Text {
                format!("\n{}:", msg.role.transcript_label())
            } else {
                format!(
                    "\n{} [{}]:",
                    msg.role.transcript_label(),
                    msg.message_type.transcript_label()
                )
            };
            lines.push(header);
            lines.push(truncate_chars(&msg.content, TRANSCRIPT_CONTENT_LIMIT));

            if let Some(action) = msg.metadata.get("action") {
                lines.push(format!("  -> Action: {}", inline_value(action)));
            }
            if let Some(sections) = msg.metadata.get("sections_reordered") {
                lines.push(format!(
                    "  -> Sections reordered: {}",
                    inline_value(sections)
                ));
            }
        }

        lines.push(format!("\n{}", "=".repeat(50)));
        lines.join("\n")
    }

    /// Formats history as provider chat turns. The provider knows only `user`
    /// and `model` roles: system messages become user turns carrying a visible
    /// context tag, assistant messages become model turns. The same
    /// suffix-window semantics as the transcript formatter apply.
    pub fn format_for_chat_turns(
        &self,
        session_id: &str,
        max_messages: Option<usize>,
    ) -> Vec<ChatTurn> {
        let messages = self.history(session_id);
        let messages = apply_window(&messages, max_messages);

        messages
            .iter()
            .map(|msg| {
                let (role, text) = match msg.role {
                    Role::System => ("user", format!("[SYSTEM CONTEXT] {}", msg.content)),
                    Role::Assistant => ("model", msg.content.clone()),
                    Role::User => ("user", msg.content.clone()),
                };
                ChatTurn {
                    role: role.to_string(),
                    parts: vec![TurnPart { text }],
                }
            })
            .collect()
    }

    /// Removes a session entirely. Idempotent.
    pub fn clear(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().expect("chat store poisoned");
        sessions.remove(session_id);
    }

    pub fn session_count(&self) -> usize {
        let sessions = self.sessions.lock().expect("chat store poisoned");
        sessions.len()
    }

    pub fn message_count(&self, session_id: &str) -> usize {
        let sessions = self.sessions.lock().expect("chat store poisoned");
        sessions.get(session_id).map(Vec::len).unwrap_or(0)
    }

    /// Serializes a session's history as pretty JSON.
    pub fn export_session(&self, session_id: &str) -> String {
        let history = self.history(session_id);
        serde_json::to_string_pretty(&history).expect("chat history always serializes")
    }

    /// Replaces a session's history wholesale from exported JSON.
    pub fn import_session(&self, session_id: &str, json_data: &str) -> Result<(), serde_json::Error> {
        let messages: Vec<ChatMessage> = serde_json::from_str(json_data)?;
        let mut sessions = self.sessions.lock().expect("chat store poisoned");
        sessions.insert(session_id.to_string(), messages);
        Ok(())
    }
}

/// Most recent N messages (suffix). `None` means no limit.
fn apply_window(messages: &[ChatMessage], max_messages: Option<usize>) -> &[ChatMessage] {
    match max_messages {
        Some(max) if messages.len() > max => &messages[messages.len() - max..],
        _ => messages,
    }
}

fn truncate_chars(content: &str, limit: usize) -> String {
    content.chars().take(limit).collect()
}

/// Metadata values render as bare strings; everything else as compact JSON.
fn inline_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
