//! Theme and Colors
//!
//! The partchat palette. Flat colors for roles and chrome, plus the styles the
//! markdown renderer applies to assistant replies.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Role Colors
// ============================================================================

/// User text - soft green
pub const USER_GREEN: Color = Color::Rgb(130, 220, 130);

/// Assistant label - PartSelect teal
pub const ASSISTANT_TEAL: Color = Color::Rgb(51, 118, 121);

/// Assistant body text
pub const ASSISTANT_TEXT: Color = Color::Rgb(220, 220, 220);

/// Fallback reply - muted red
pub const FALLBACK_RED: Color = Color::Rgb(230, 120, 120);

// ============================================================================
// Markdown Colors
// ============================================================================

/// Headings - warm yellow
pub const HEADING_YELLOW: Color = Color::Rgb(235, 203, 139);

/// Inline and block code
pub const CODE_ORANGE: Color = Color::Rgb(208, 135, 112);

/// Code block background
pub const CODE_BG: Color = Color::Rgb(46, 52, 64);

/// Links
pub const LINK_BLUE: Color = Color::Rgb(129, 161, 193);

/// Block quote bar and list markers
pub const ACCENT_CYAN: Color = Color::Rgb(136, 192, 208);

// ============================================================================
// UI Colors
// ============================================================================

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Warnings in the status bar
pub const WARN_AMBER: Color = Color::Rgb(255, 191, 0);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Success green
pub const SUCCESS_GREEN: Color = Color::Rgb(120, 230, 120);

// ============================================================================
// Styles
// ============================================================================

/// Plain assistant prose
#[must_use]
pub fn body() -> Style {
    Style::default().fg(ASSISTANT_TEXT)
}

/// Heading of the given level (1-6)
#[must_use]
pub fn heading(level: u8) -> Style {
    let style = Style::default()
        .fg(HEADING_YELLOW)
        .add_modifier(Modifier::BOLD);
    if level == 1 {
        style.add_modifier(Modifier::UNDERLINED)
    } else {
        style
    }
}

/// Inline `code`
#[must_use]
pub fn inline_code() -> Style {
    Style::default().fg(CODE_ORANGE)
}

/// Fenced or indented code block line
#[must_use]
pub fn code_block() -> Style {
    Style::default().fg(ASSISTANT_TEXT).bg(CODE_BG)
}

/// Link text
#[must_use]
pub fn link() -> Style {
    Style::default()
        .fg(LINK_BLUE)
        .add_modifier(Modifier::UNDERLINED)
}

/// Link target shown after the text
#[must_use]
pub fn link_url() -> Style {
    Style::default().fg(DIM_GRAY)
}

/// Bullet or number in front of a list item
#[must_use]
pub fn list_marker() -> Style {
    Style::default().fg(ACCENT_CYAN)
}

/// Block quote bar
#[must_use]
pub fn quote_bar() -> Style {
    Style::default().fg(ACCENT_CYAN)
}

/// Dim chrome (rules, separators, hints)
#[must_use]
pub fn dim() -> Style {
    Style::default().fg(DIM_GRAY)
}
