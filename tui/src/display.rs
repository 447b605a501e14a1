//! Display State Types
//!
//! Types that represent the current display state for the TUI.
//! These are derived from [`ConversationSnapshot`]s and send outcomes, and are
//! the only thing the renderer reads.
//!
//! # Design Philosophy
//!
//! The TUI is a "thin client" - it renders what the controller publishes.
//! Display state is the bridge between snapshots and rendering:
//!
//! - `DisplayMessage`: a sanitized transcript entry
//! - `DisplayNotification`: a short-lived status bar message
//! - `BackendStatus`: result of the startup health probe

use partchat_core::{
    sanitize_for_display, ConversationSnapshot, Message, MessageRole, SendOutcome,
};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::markdown;
use crate::theme;

/// Spinner frames shown while a reply is outstanding
pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Ticks a notification stays visible (100ms ticks)
pub const NOTIFICATION_TICKS: u32 = 40;

/// Indent of assistant body lines under the role header
const ASSISTANT_INDENT: &str = "  ";

/// Display role for messages
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayRole {
    /// User input
    User,
    /// Assistant reply
    Assistant,
}

impl From<MessageRole> for DisplayRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => DisplayRole::User,
            MessageRole::Assistant => DisplayRole::Assistant,
        }
    }
}

impl DisplayRole {
    /// Get the prefix for this role
    pub fn prefix(&self) -> &'static str {
        match self {
            DisplayRole::User => "You: ",
            DisplayRole::Assistant => "Assistant: ",
        }
    }
}

/// A rendered conversation message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayMessage {
    /// Who sent this message
    pub role: DisplayRole,
    /// The message content, stripped of terminal control sequences
    pub content: String,
    /// Whether this is the connection-failure reply
    pub is_fallback: bool,
}

impl From<&Message> for DisplayMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.into(),
            content: sanitize_for_display(&message.content).into_owned(),
            is_fallback: message.is_fallback(),
        }
    }
}

/// Notification severity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warning,
    Error,
}

/// A status bar notification that expires after a while
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayNotification {
    pub level: NotifyLevel,
    pub message: String,
    /// Ticks left before it disappears
    pub remaining_ticks: u32,
}

/// What the startup health probe found
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendStatus {
    /// Probe still running (or never run)
    #[default]
    Unknown,
    Reachable,
    Unreachable,
}

/// Complete display state
#[derive(Clone, Debug, Default)]
pub struct DisplayState {
    /// Conversation messages
    pub messages: Vec<DisplayMessage>,
    /// Whether a reply is outstanding
    pub sending: bool,
    /// Input draft mirrored from the controller
    pub draft: String,
    /// Revision of the last applied snapshot
    pub revision: u64,
    /// Backend reachability
    pub backend: BackendStatus,
    /// Pending notification (if any)
    pub notification: Option<DisplayNotification>,
    /// Current spinner frame index
    pub spinner_frame: usize,
}

impl DisplayState {
    /// Create a new display state
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a controller snapshot
    ///
    /// Stale snapshots (lower revision than the last applied) are skipped.
    /// Returns true when the transcript changed.
    pub fn apply_snapshot(&mut self, snapshot: &ConversationSnapshot) -> bool {
        if snapshot.revision < self.revision {
            return false;
        }
        self.revision = snapshot.revision;
        self.sending = snapshot.sending;
        self.draft.clone_from(&snapshot.draft);

        // The log is append-only, so only the tail can be new
        let changed = snapshot.messages.len() != self.messages.len();
        if snapshot.messages.len() < self.messages.len() {
            // New session
            self.messages.clear();
        }
        let known = self.messages.len();
        self.messages
            .extend(snapshot.messages[known..].iter().map(DisplayMessage::from));
        changed
    }

    /// Surface the result of a send in the status bar
    pub fn apply_outcome(&mut self, outcome: &SendOutcome) {
        match outcome {
            SendOutcome::Busy => {
                self.notify(NotifyLevel::Warning, "Busy: still waiting for the previous reply");
            }
            SendOutcome::Rejected(rejection) => {
                self.notify(NotifyLevel::Error, rejection.to_string());
            }
            SendOutcome::Delivered(message) if message.is_fallback() => {
                self.notify(NotifyLevel::Error, "Request failed");
            }
            SendOutcome::Ignored | SendOutcome::Delivered(_) | SendOutcome::Superseded => {}
        }
    }

    /// Record the health probe result
    pub fn set_backend(&mut self, reachable: bool) {
        self.backend = if reachable {
            BackendStatus::Reachable
        } else {
            self.notify(NotifyLevel::Warning, "Backend did not answer the health check");
            BackendStatus::Unreachable
        };
    }

    /// Show a notification
    pub fn notify(&mut self, level: NotifyLevel, message: impl Into<String>) {
        self.notification = Some(DisplayNotification {
            level,
            message: message.into(),
            remaining_ticks: NOTIFICATION_TICKS,
        });
    }

    /// Advance animations and expire notifications
    pub fn tick(&mut self) {
        if self.sending {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        }
        if let Some(n) = &mut self.notification {
            n.remaining_ticks = n.remaining_ticks.saturating_sub(1);
            if n.remaining_ticks == 0 {
                self.notification = None;
            }
        }
    }

    /// Current spinner glyph
    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    /// Status bar text and style
    pub fn status(&self, scroll_offset: usize) -> (String, Style) {
        if let Some(n) = &self.notification {
            let color = match n.level {
                NotifyLevel::Info => theme::ACCENT_CYAN,
                NotifyLevel::Warning => theme::WARN_AMBER,
                NotifyLevel::Error => theme::ERROR_RED,
            };
            return (format!(" {}", n.message), Style::default().fg(color));
        }

        let state = if self.sending {
            format!("{} Thinking...", self.spinner())
        } else {
            match self.backend {
                BackendStatus::Unknown => "Connecting".to_string(),
                BackendStatus::Reachable => "Ready".to_string(),
                BackendStatus::Unreachable => "Backend unreachable".to_string(),
            }
        };
        let scroll = if scroll_offset > 0 {
            format!(" [^{scroll_offset} lines - PgDn to scroll]")
        } else {
            String::new()
        };
        (
            format!(" {state} | Enter send | Ctrl+N new chat | Esc quit{scroll}"),
            theme::dim(),
        )
    }

    /// Transcript as styled lines no wider than `width`
    pub fn transcript_lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for (i, message) in self.messages.iter().enumerate() {
            if i > 0 {
                lines.push(Line::default());
            }
            match message.role {
                DisplayRole::User => push_user(&mut lines, message, width),
                DisplayRole::Assistant => push_assistant(&mut lines, message, width),
            }
        }
        if self.sending {
            if !lines.is_empty() {
                lines.push(Line::default());
            }
            lines.push(Line::from(vec![
                Span::styled(
                    DisplayRole::Assistant.prefix(),
                    Style::default()
                        .fg(theme::ASSISTANT_TEAL)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{} thinking...", self.spinner()), theme::dim()),
            ]));
        }
        lines
    }

    /// Draft wrapped for the input box, with a trailing cursor
    pub fn input_lines(&self, width: usize) -> Vec<String> {
        let full = format!("{}{}_", DisplayRole::User.prefix(), self.draft);
        full.split('\n')
            .flat_map(|part| {
                textwrap::wrap(part, width.max(1))
                    .into_iter()
                    .map(|s| s.into_owned())
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

fn push_user(lines: &mut Vec<Line<'static>>, message: &DisplayMessage, width: usize) {
    let prefix = DisplayRole::User.prefix();
    let label = Span::styled(
        prefix,
        Style::default()
            .fg(theme::USER_GREEN)
            .add_modifier(Modifier::BOLD),
    );
    let hang = vec![Span::raw(" ".repeat(prefix.len()))];
    let text_style = Style::default().fg(theme::USER_GREEN);

    for (i, paragraph) in message.content.split('\n').enumerate() {
        let first = if i == 0 { vec![label.clone()] } else { hang.clone() };
        let spans = [Span::styled(paragraph.to_string(), text_style)];
        lines.extend(markdown::wrap_spans(&spans, width, first, &hang));
    }
}

fn push_assistant(lines: &mut Vec<Line<'static>>, message: &DisplayMessage, width: usize) {
    let label_color = if message.is_fallback {
        theme::FALLBACK_RED
    } else {
        theme::ASSISTANT_TEAL
    };
    lines.push(Line::from(Span::styled(
        DisplayRole::Assistant.prefix().trim_end(),
        Style::default().fg(label_color).add_modifier(Modifier::BOLD),
    )));

    let inner = width.saturating_sub(ASSISTANT_INDENT.len());
    if message.is_fallback {
        let spans = [Span::styled(
            message.content.clone(),
            Style::default().fg(theme::FALLBACK_RED),
        )];
        let indent = vec![Span::raw(ASSISTANT_INDENT)];
        lines.extend(markdown::wrap_spans(&spans, width, indent.clone(), &indent));
        return;
    }

    for line in markdown::render(&message.content, inner) {
        let mut spans = vec![Span::raw(ASSISTANT_INDENT)];
        spans.extend(line.spans);
        lines.push(Line::from(spans));
    }
}
