//! partchat Core - Headless Conversation Controller
//!
//! This crate holds everything about a chat session that is not drawing:
//! the message model, the HTTP client for the assistant service, and the
//! controller that owns the transcript and drives each request/response
//! cycle. It can back a TUI, a web front-end, or run headless in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Presentation layer                       │
//! │         (partchat-tui, or any snapshot consumer)          │
//! └──────────────┬──────────────────────────▲────────────────┘
//!                │ send_message / set_draft │ watch::Receiver
//!                ▼                          │ <ConversationSnapshot>
//! ┌──────────────────────────────────────────────────────────┐
//! │                ConversationController                     │
//! │   Conversation (append-only)  ·  draft  ·  sending flag   │
//! └──────────────┬───────────────────────────────────────────┘
//!                │ send(message, history) -> Message
//!                ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │   ChatClient  (errors become the fallback reply here)     │
//! │        └── ChatTransport: HttpTransport | test stubs      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ConversationController`]: owns session state and the send lifecycle
//! - [`ChatClient`]: one round trip per call, never fails
//! - [`Message`]: one finished turn, user or assistant
//! - [`ConversationSnapshot`]: immutable state published after every change
//! - [`ChatConfig`]: endpoint, user id and conversation settings
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use partchat_core::{load_config, ChatClient, ConversationController};
//!
//! let config = load_config()?;
//! let client = ChatClient::new(config.http_transport()?).with_user_id(config.user_id.clone());
//! let controller = Arc::new(ConversationController::new(client, config.controller_options()));
//!
//! let mut updates = controller.subscribe();
//! controller.send_message("PS12586284 water filter").await;
//! let snapshot = updates.borrow_and_update().clone();
//! ```
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod messages;
pub mod security;

pub use client::{
    ChatClient, ChatError, ChatErrorKind, ChatRequest, ChatResponse, ChatTransport, HttpTransport,
};
pub use config::{
    default_config_path, load_config, load_config_from_path, load_config_with,
    load_config_with_overrides, ChatConfig, ChatToml, ConfigError, ConfigOverrides, ConfigSource,
    DEFAULT_ENDPOINT,
};
pub use controller::{
    ControllerOptions, ConversationController, OverlapPolicy, PendingSend, SendOutcome,
};
pub use conversation::{Conversation, ConversationSnapshot};
pub use messages::{Message, MessageRole, DEFAULT_GREETING, FALLBACK_REPLY};
pub use security::{sanitize_for_display, InputLimits, InputRejection};
