//! partchat TUI - Terminal interface for the parts assistant
//!
//! A full-screen chat client over [`partchat_core`]. The core owns the
//! conversation; this crate turns its snapshots into a scrollable transcript,
//! an input box and a status bar.
//!
//! # Architecture
//!
//! - **App**: event loop, key handling, spawned sends
//! - **Display**: snapshot-derived display state and transcript layout
//! - **Markdown**: assistant replies rendered to styled lines
//! - **Widgets**: borderless, bottom-anchored transcript

pub mod app;
pub mod cli;
pub mod display;
pub mod logging;
pub mod markdown;
pub mod theme;
pub mod widgets;

pub use app::App;
pub use cli::Cli;
