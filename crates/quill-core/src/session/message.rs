//! Conversation message types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
    /// System-generated message.
    System,
}

impl MessageRole {
    /// Stable lowercase name, matching the wire and file formats.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation history.
///
/// Messages are strictly append-ordered; insertion order is chronological
/// order. Every message carries the identifier of the session it belongs
/// to, which survives save/load round trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
    /// Seconds since the Unix epoch at creation time.
    pub timestamp: f64,
    /// Identifier of the owning session.
    pub session_id: String,
    /// Free-form metadata attached at append time.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}
