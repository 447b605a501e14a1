//! Security Module
//!
//! Validation at the two places untrusted text crosses a boundary:
//!
//! - Outgoing user input, checked against [`InputLimits`] before it enters
//!   the conversation
//! - Incoming assistant text, cleaned by [`sanitize_for_display`] before the
//!   presentation layer renders it
//!
//! Assistant content comes from a remote service and is rendered into a
//! terminal. Escape sequences in it could move the cursor, rewrite the title
//! or clear the screen, so they are stripped rather than trusted.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum size of one outgoing message (32 KiB)
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 32 * 1024;

const ESC: char = '\u{1b}';
const BEL: char = '\u{07}';
const CSI_C1: char = '\u{9b}';
const OSC_C1: char = '\u{9d}';
const ST_C1: char = '\u{9c}';

/// Limits applied to outgoing user messages
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLimits {
    /// Maximum size of a single message in bytes
    pub max_message_bytes: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

impl InputLimits {
    /// Check a message against the limits
    ///
    /// # Errors
    ///
    /// Returns the reason the message may not be sent.
    pub fn validate(&self, text: &str) -> Result<(), InputRejection> {
        if text.len() > self.max_message_bytes {
            return Err(InputRejection::TooLarge {
                len: text.len(),
                max: self.max_message_bytes,
            });
        }
        Ok(())
    }
}

/// Why a message was refused before sending
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InputRejection {
    /// Message exceeds `max_message_bytes`
    #[error("Message too large: {len} bytes (max: {max})")]
    TooLarge {
        /// Actual size in bytes
        len: usize,
        /// Configured maximum
        max: usize,
    },
}

/// Whether a character survives sanitisation untouched
fn is_safe(c: char) -> bool {
    !c.is_control() || c == '\n' || c == '\t'
}

/// Strip terminal escape sequences and control characters
///
/// Keeps `\n` and `\t`, folds `\r\n` into `\n` and drops lone `\r`. CSI
/// (`ESC [ ... final`) and OSC (`ESC ] ... BEL|ST`) sequences are removed
/// whole, along with their C1 single-byte forms. Returns the input unchanged
/// (borrowed) when there is nothing to strip.
#[must_use]
pub fn sanitize_for_display(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_safe) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ESC => match chars.next() {
                Some('[') => skip_csi(&mut chars),
                Some(']') => skip_osc(&mut chars),
                // Two-character escape (ESC c, ESC 7, ...) or a trailing ESC
                _ => {}
            },
            CSI_C1 => skip_csi(&mut chars),
            OSC_C1 => skip_osc(&mut chars),
            // `\r\n` keeps its `\n`; a lone `\r` would overwrite the line
            '\r' => {}
            c if is_safe(c) => out.push(c),
            _ => {}
        }
    }

    Cow::Owned(out)
}

/// Consume a CSI body up to and including its final byte
fn skip_csi(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    for c in chars.by_ref() {
        if ('\u{40}'..='\u{7e}').contains(&c) {
            break;
        }
    }
}

/// Consume an OSC body up to and including its terminator
fn skip_osc(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while let Some(c) = chars.next() {
        match c {
            BEL | ST_C1 => break,
            ESC => {
                if chars.peek() == Some(&'\\') {
                    chars.next();
                }
                break;
            }
            _ => {}
        }
    }
}
