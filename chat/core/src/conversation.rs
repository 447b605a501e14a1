//! Conversation Log
//!
//! The ordered, append-only record of one chat session.
//!
//! # Design Philosophy
//!
//! A conversation only ever grows. Messages are never reordered, edited or
//! removed, so insertion order is chronological order is render order. A
//! session may open with a seeded assistant greeting; that greeting is part of
//! the transcript but is never echoed back to the backend as history.

use serde::{Deserialize, Serialize};

use crate::messages::Message;

/// Append-only message log for a single session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
    /// Whether `messages[0]` is the seeded greeting
    seeded: bool,
}

impl Conversation {
    /// Create an empty conversation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation that opens with an assistant greeting
    pub fn seeded(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(greeting)],
            seeded: true,
        }
    }

    /// Append a message to the end of the log
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages in order, greeting included
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages, greeting included
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log holds no messages at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether the first message is a seeded greeting
    #[must_use]
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// The most recent message
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Messages that make up the backend history payload
    ///
    /// Everything except the seeded greeting, in order.
    #[must_use]
    pub fn history(&self) -> &[Message] {
        let skip = usize::from(self.seeded).min(self.messages.len());
        &self.messages[skip..]
    }
}

/// Immutable view of controller state handed to the presentation layer
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    /// Transcript in render order
    pub messages: Vec<Message>,
    /// True while at least one request is outstanding
    pub sending: bool,
    /// Current contents of the input draft
    pub draft: String,
    /// Publication counter, increases with every snapshot
    pub revision: u64,
}

impl ConversationSnapshot {
    /// Number of transcript messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
