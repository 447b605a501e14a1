//! Chat Client
//!
//! Wraps a [`ChatTransport`] and guarantees a well-formed assistant
//! [`Message`] for every call. Failures are matched exactly once, here, and
//! turned into the fallback reply; nothing above this layer handles raw errors.

use super::error::ChatError;
use super::traits::{ChatRequest, ChatTransport};
use crate::messages::Message;

/// Infallible facade over a chat transport
pub struct ChatClient<T: ChatTransport> {
    /// Underlying exchange
    transport: T,
    /// Static user id attached to every request
    user_id: Option<String>,
}

impl<T: ChatTransport> ChatClient<T> {
    /// Create a client over `transport`
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            user_id: None,
        }
    }

    /// Attach a static user id to every request
    #[must_use]
    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    /// The wrapped transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the request body for `message`
    #[must_use]
    pub fn build_request(&self, message: &str, history: &[Message]) -> ChatRequest {
        ChatRequest::new(message, history.to_vec()).with_user_id(self.user_id.clone())
    }

    /// Perform one round trip, keeping the failure kind visible
    ///
    /// # Errors
    ///
    /// Returns the classified transport failure, or `Malformed` if the
    /// backend answered with a blank reply.
    pub async fn try_send(&self, message: &str, history: &[Message]) -> Result<Message, ChatError> {
        let request = self.build_request(message, history);

        tracing::debug!(
            transport = self.transport.name(),
            history_len = request.conversation_history.len(),
            "Sending chat request"
        );

        let response = self.transport.round_trip(&request).await?;

        if !response.tools_used.is_empty() {
            tracing::debug!(tools = ?response.tools_used, "Backend used tools");
        }

        if response.response.trim().is_empty() {
            return Err(ChatError::malformed("backend returned an empty `response`"));
        }

        Ok(Message::assistant(response.response))
    }

    /// Perform one round trip; never fails
    ///
    /// Any error becomes [`Message::fallback`] and is logged.
    pub async fn send(&self, message: &str, history: &[Message]) -> Message {
        match self.try_send(message, history).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    kind = %e.kind,
                    retryable = e.kind.is_retryable(),
                    error = %e,
                    "Chat request failed, substituting fallback reply"
                );
                Message::fallback()
            }
        }
    }

    /// Whether the backend looks reachable
    pub async fn health_check(&self) -> bool {
        self.transport.health_check().await
    }
}
