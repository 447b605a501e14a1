//! Chat error types
//!
//! Failures are classified so they can be logged and inspected, even though
//! the [`ChatClient`](super::ChatClient) collapses every kind into the same
//! fallback reply.

use thiserror::Error;

/// A failed round trip with its classification
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct ChatError {
    /// What went wrong
    pub kind: ChatErrorKind,
    /// Human-readable detail for the diagnostic log
    pub message: String,
}

impl ChatError {
    /// Create an error of the given kind
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Connection refused, reset, DNS failure and the like
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Network, message)
    }

    /// The transport gave up waiting
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Timeout, message)
    }

    /// Body could not be decoded, or lacked a usable `response`
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Malformed, message)
    }

    /// Non-success HTTP status
    pub fn status(code: u16, body: &str) -> Self {
        let kind = if (400..500).contains(&code) {
            ChatErrorKind::ClientStatus(code)
        } else {
            ChatErrorKind::ServerStatus(code)
        };
        let detail: String = body.chars().take(200).collect();
        Self::new(kind, format!("backend returned {code}: {detail}"))
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else if err.is_decode() {
            Self::malformed(err.to_string())
        } else if let Some(status) = err.status() {
            Self::status(status.as_u16(), &err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    /// Transport-level failure before a response arrived
    Network,
    /// Request exceeded the configured timeout
    Timeout,
    /// 4xx response
    ClientStatus(u16),
    /// 5xx or any other non-success response
    ServerStatus(u16),
    /// Unparseable body or missing/blank `response` field
    Malformed,
}

impl ChatErrorKind {
    /// Whether a retry could plausibly succeed
    ///
    /// Informational only; the client never retries on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::ServerStatus(_))
    }
}

impl std::fmt::Display for ChatErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network error"),
            Self::Timeout => write!(f, "timeout"),
            Self::ClientStatus(code) => write!(f, "client error ({code})"),
            Self::ServerStatus(code) => write!(f, "server error ({code})"),
            Self::Malformed => write!(f, "malformed response"),
        }
    }
}
