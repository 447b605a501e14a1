//! Chat Transport Traits
//!
//! The seam beneath [`ChatClient`](super::ChatClient). A transport performs
//! the raw exchange with the assistant service and is allowed to fail; the
//! client above it is not.
//!
//! # Wire Format
//!
//! ```text
//! POST <endpoint>   Content-Type: application/json
//! { "message": "...", "conversation_history": [{"role": "user", "content": "..."}], "user_id": "..." }
//!
//! 200 OK
//! { "response": "...", "tools_used": ["..."] }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::ChatError;
use crate::messages::Message;

/// Request body sent to the chat endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's newest message
    pub message: String,
    /// Prior turns plus the newest user message, oldest first
    pub conversation_history: Vec<Message>,
    /// Static caller identifier, omitted when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl ChatRequest {
    /// Create a request without a user id
    pub fn new(message: impl Into<String>, conversation_history: Vec<Message>) -> Self {
        Self {
            message: message.into(),
            conversation_history,
            user_id: None,
        }
    }

    /// Attach a user id
    #[must_use]
    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }
}

/// Success body returned by the chat endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant reply text
    pub response: String,
    /// Backend tools invoked while answering (informational)
    #[serde(default)]
    pub tools_used: Vec<String>,
}

impl ChatResponse {
    /// Create a response with no tool usage
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            tools_used: Vec::new(),
        }
    }
}

/// A single request/response exchange with the assistant service
///
/// Implement this to point the client at a different backend, or to stub the
/// network in tests.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Short name for logs (e.g. "http")
    fn name(&self) -> &str;

    /// Perform one round trip
    async fn round_trip(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError>;

    /// Whether the service looks reachable
    async fn health_check(&self) -> bool {
        true
    }
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn round_trip(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        (**self).round_trip(request).await
    }

    async fn health_check(&self) -> bool {
        (**self).health_check().await
    }
}
