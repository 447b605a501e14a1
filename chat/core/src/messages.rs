//! Conversation Messages
//!
//! The atomic unit of a transcript. A message is one finished turn, authored
//! either by the user or by the assistant.
//!
//! # Design Philosophy
//!
//! Messages are plain values. They carry finished text only: there is no
//! streaming or partial state, so anything holding a `Message` can render it
//! as-is. The serialised form doubles as the backend's
//! `conversation_history` entry format (`{"role": "user", "content": "..."}`).

use serde::{Deserialize, Serialize};

/// Greeting seeded as the first assistant message of a new session
pub const DEFAULT_GREETING: &str = "Hi, I'm the PartSelect Agent Helper. How can I help you today? \
Currently, I can help you find parts for your refrigerator or dishwasher as well as help you \
with your transactions.";

/// Assistant text substituted whenever a round trip fails for any reason
pub const FALLBACK_REPLY: &str = "Sorry, I'm having connection issues. Please try again.";

/// Who authored a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Typed by the person using the front-end
    User,
    /// Produced by the remote assistant service (or the fallback)
    Assistant,
}

impl MessageRole {
    /// Wire name of the role
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of the conversation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: MessageRole,
    /// Finished message text
    pub content: String,
}

impl Message {
    /// Create a new message
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// The fixed assistant reply used when a round trip fails
    #[must_use]
    pub fn fallback() -> Self {
        Self::assistant(FALLBACK_REPLY)
    }

    /// The seeded greeting
    #[must_use]
    pub fn greeting() -> Self {
        Self::assistant(DEFAULT_GREETING)
    }

    /// Whether this is the fallback reply
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.role == MessageRole::Assistant && self.content == FALLBACK_REPLY
    }

    /// Whether the user authored this message
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}
