//! Widgets

pub mod transcript;

pub use transcript::{Transcript, TranscriptState};
