use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Who produced a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Label used in the human-readable transcript.
    pub fn transcript_label(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Assistant => "AGENT",
            Role::System => "SYSTEM",
        }
    }
}

/// Which agent operation a message belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Build,
    Edit,
    Rearrange,
}

impl MessageType {
    pub fn transcript_label(&self) -> &'static str {
        match self {
            MessageType::Text => "TEXT",
            MessageType::Build => "BUILD",
            MessageType::Edit => "EDIT",
            MessageType::Rearrange => "REARRANGE",
        }
    }
}

/// A single message in a session's conversation log. Immutable once appended;
/// insertion order within a session is the causal conversation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(
        role: Role,
        content: impl Into<String>,
        message_type: MessageType,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            role,
            content: content.into(),
            message_type,
            metadata,
            timestamp: Utc::now(),
        }
    }
}
