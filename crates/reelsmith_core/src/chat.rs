//! Chat log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The human
    #[display("user")]
    User,
    /// The assistant model
    #[display("model")]
    Model,
}

/// One entry in the append-only chat log.
///
/// # Examples
///
/// ```
/// use reelsmith_core::{ChatMessage, ChatRole};
///
/// let message = ChatMessage::new(ChatRole::User, "Hello");
/// assert_eq!(message.role, ChatRole::User);
/// assert_eq!(message.text, "Hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique id
    pub id: String,
    /// Author
    pub role: ChatRole,
    /// Message text; a streaming model reply grows in place
    pub text: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message with a fresh id stamped now.
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), role, text)
    }

    /// Create a message with a caller-chosen id.
    pub fn with_id(id: impl Into<String>, role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}
