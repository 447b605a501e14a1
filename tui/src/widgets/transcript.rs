//! Transcript Widget
//!
//! A borderless, bottom-anchored, scrollable region of pre-rendered lines.
//! Scrolling is measured from the bottom so that new content stays in view
//! unless the user has scrolled up.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::StatefulWidget;

/// Scroll state for a transcript
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TranscriptState {
    /// Scroll offset (lines up from the bottom, 0 = latest)
    pub scroll_offset: usize,
    /// Total content lines at the last render
    pub total_lines: usize,
    /// Visible height at the last render
    pub viewport: usize,
}

impl TranscriptState {
    /// Largest useful offset
    pub fn max_scroll(&self) -> usize {
        self.total_lines.saturating_sub(self.viewport)
    }

    /// Scroll towards older lines
    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = (self.scroll_offset + lines).min(self.max_scroll());
    }

    /// Scroll towards newer lines
    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Jump to the latest line
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    /// Jump to the first line
    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = self.max_scroll();
    }

    /// Whether the latest line is visible
    pub fn is_at_bottom(&self) -> bool {
        self.scroll_offset == 0
    }

    /// Half a viewport, at least one line
    pub fn page(&self) -> usize {
        (self.viewport / 2).max(1)
    }
}

/// Scrollable transcript of styled lines
pub struct Transcript<'a> {
    lines: &'a [Line<'static>],
}

impl<'a> Transcript<'a> {
    pub fn new(lines: &'a [Line<'static>]) -> Self {
        Self { lines }
    }
}

impl StatefulWidget for Transcript<'_> {
    type State = TranscriptState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let height = area.height as usize;
        state.total_lines = self.lines.len();
        state.viewport = height;

        // Clamp scroll
        state.scroll_offset = state.scroll_offset.min(state.max_scroll());

        let end = state.total_lines - state.scroll_offset;
        let start = end.saturating_sub(height);
        let visible = &self.lines[start..end];

        // Short transcripts sit at the bottom, next to the input box
        let top = area.y + (height - visible.len()) as u16;
        for (i, line) in visible.iter().enumerate() {
            buf.set_line(area.x, top + i as u16, line, area.width);
        }
    }
}
