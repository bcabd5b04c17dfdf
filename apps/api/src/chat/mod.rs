// Conversation history shared across the build, edit and reorder agents.
// The store is injectable, owned by AppState behind an Arc — one store per
// running process, but never a hidden global.

pub mod message;
pub mod store;

pub use message::{ChatMessage, MessageType, Role};
pub use store::{ChatStore, ChatTurn, TurnPart};
