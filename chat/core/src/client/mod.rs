//! Chat Backend Integration
//!
//! Everything needed to talk to the assistant service:
//!
//! - [`ChatTransport`]: one raw, fallible exchange (HTTP in production, stubs in tests)
//! - [`HttpTransport`]: `reqwest`-based JSON transport
//! - [`ChatClient`]: infallible facade that always yields an assistant [`Message`](crate::Message)
//!
//! # Usage
//!
//! ```ignore
//! use partchat_core::client::{ChatClient, HttpTransport};
//!
//! let transport = HttpTransport::new("http://localhost:8000/api/v1/chat".parse()?, None)?;
//! let client = ChatClient::new(transport);
//! let reply = client.send("PS12586284 water filter", &history).await;
//! ```

mod chat;
mod error;
mod http;
mod traits;

pub use chat::ChatClient;
pub use error::{ChatError, ChatErrorKind};
pub use http::HttpTransport;
pub use traits::{ChatRequest, ChatResponse, ChatTransport};
