//! Markdown Rendering
//!
//! Turns assistant markdown into styled, width-wrapped terminal lines.
//! [`render`] is a pure function of its input: same text and width, same
//! lines. Callers sanitize untrusted text before handing it over.
//!
//! Supported: headings, emphasis, strong, strikethrough, inline code, code
//! blocks, bullet/numbered/task lists (nested), block quotes, rules and links
//! (shown as `text <url>`). Anything else degrades to plain text.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::theme;

/// Narrowest width the renderer lays out for
const MIN_WIDTH: usize = 8;

/// Indent of code block lines
const CODE_INDENT: &str = "  ";

/// Render markdown `text` into lines no wider than `width` columns
#[must_use]
pub fn render(text: &str, width: usize) -> Vec<Line<'static>> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut renderer = Renderer::new(width.max(MIN_WIDTH));
    for event in Parser::new_ext(text, options) {
        renderer.handle(event);
    }
    renderer.finish()
}

/// Nesting level of a list being rendered
struct ListLevel {
    /// Next number for ordered lists
    next: Option<u64>,
    /// Width of the current item's marker
    indent: usize,
}

/// Event-driven line builder
struct Renderer {
    width: usize,
    lines: Vec<Line<'static>>,
    /// Inline content of the block being built
    spans: Vec<Span<'static>>,
    /// Inline style stack
    styles: Vec<Style>,
    lists: Vec<ListLevel>,
    /// Marker for the first line of the current list item
    marker: Option<String>,
    quote_depth: usize,
    in_code_block: bool,
    /// Targets of open links
    links: Vec<String>,
}

impl Renderer {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            spans: Vec::new(),
            styles: Vec::new(),
            lists: Vec::new(),
            marker: None,
            quote_depth: 0,
            in_code_block: false,
            links: Vec::new(),
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_else(theme::body)
    }

    fn push_style(&mut self, patch: Style) {
        let style = self.style().patch(patch);
        self.styles.push(style);
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.code_text(&text);
                } else {
                    self.text(&text, self.style());
                }
            }
            Event::Code(code) => self.text(&code, theme::inline_code()),
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html, self.style()),
            Event::SoftBreak => self.text(" ", self.style()),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines.push(Line::styled("─".repeat(self.width), theme::dim()));
                self.blank();
            }
            Event::TaskListMarker(checked) => {
                let mark = if checked { "[x] " } else { "[ ] " };
                self.text(mark, theme::list_marker());
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                self.push_style(theme::heading(heading_level(level)));
            }
            Tag::BlockQuote { .. } => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(ListLevel {
                    next: start,
                    indent: 0,
                });
            }
            Tag::Item => {
                self.flush();
                if let Some(level) = self.lists.last_mut() {
                    let marker = match level.next {
                        Some(n) => {
                            level.next = Some(n + 1);
                            format!("{n}. ")
                        }
                        None => "• ".to_string(),
                    };
                    level.indent = marker.width();
                    self.marker = Some(marker);
                }
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT));
            }
            Tag::Link { dest_url, .. } => {
                self.push_style(theme::link());
                self.links.push(dest_url.to_string());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Heading { .. } => {
                self.flush();
                self.pop_style();
                self.blank();
            }
            TagEnd::BlockQuote { .. } => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::List { .. } => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.links.pop() {
                    let shown = self.spans.last().is_some_and(|s| s.content == url.as_str());
                    if !url.is_empty() && !shown {
                        self.spans.push(Span::styled(format!(" <{url}>"), theme::link_url()));
                    }
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str, style: Style) {
        self.spans.push(Span::styled(text.to_string(), style));
    }

    /// Emit code block lines verbatim, hard-wrapped
    fn code_text(&mut self, text: &str) {
        for raw in text.lines() {
            let (mut first, _) = self.prefixes();
            first.push(Span::styled(CODE_INDENT, theme::code_block()));
            let rest = first.clone();
            let content = [Span::styled(raw.to_string(), theme::code_block())];
            self.lines
                .extend(hard_wrap(&content, self.width, first, &rest));
        }
    }

    /// Prefix spans for the first and following lines of a block
    fn prefixes(&mut self) -> (Vec<Span<'static>>, Vec<Span<'static>>) {
        let mut base = Vec::new();
        for _ in 0..self.quote_depth {
            base.push(Span::styled("│ ", theme::quote_bar()));
        }

        let Some((innermost, outer)) = self.lists.split_last() else {
            return (base.clone(), base);
        };
        let outer_indent: usize = outer.iter().map(|l| l.indent).sum();
        if outer_indent > 0 {
            base.push(Span::raw(" ".repeat(outer_indent)));
        }

        let mut first = base.clone();
        let mut rest = base;
        let hang = " ".repeat(innermost.indent);
        match self.marker.take() {
            Some(marker) => first.push(Span::styled(marker, theme::list_marker())),
            None => first.push(Span::raw(hang.clone())),
        }
        rest.push(Span::raw(hang));
        (first, rest)
    }

    /// Wrap pending inline content into lines
    fn flush(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);
        let (first, rest) = self.prefixes();
        self.lines.extend(wrap_spans(&spans, self.width, first, &rest));
    }

    /// Separate blocks with a single empty line
    fn blank(&mut self) {
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

// ============================================================================
// Wrapping
// ============================================================================

/// A line under construction
struct LineBuilder {
    spans: Vec<Span<'static>>,
    width: usize,
    has_content: bool,
}

impl LineBuilder {
    fn new(prefix: Vec<Span<'static>>) -> Self {
        let width = prefix.iter().map(Span::width).sum();
        Self {
            spans: prefix,
            width,
            has_content: false,
        }
    }

    fn push(&mut self, text: &str, style: Style) {
        self.width += text.width();
        if self.has_content {
            if let Some(last) = self.spans.last_mut() {
                if last.style == style {
                    last.content.to_mut().push_str(text);
                    return;
                }
            }
        }
        self.spans.push(Span::styled(text.to_string(), style));
        self.has_content = true;
    }

    fn finish(self) -> Line<'static> {
        Line::from(self.spans)
    }
}

/// Word or run of whitespace
enum Token {
    Space,
    Word(Vec<(String, Style)>),
}

/// Split styled spans into words, keeping a word whole across style changes
fn tokenize(spans: &[Span<'static>]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word: Vec<(String, Style)> = Vec::new();

    for span in spans {
        for ch in span.content.chars() {
            if ch.is_whitespace() {
                if !word.is_empty() {
                    tokens.push(Token::Word(std::mem::take(&mut word)));
                }
                if !matches!(tokens.last(), Some(Token::Space)) {
                    tokens.push(Token::Space);
                }
                continue;
            }
            match word.last_mut() {
                Some((text, style)) if *style == span.style => text.push(ch),
                _ => word.push((ch.to_string(), span.style)),
            }
        }
    }
    if !word.is_empty() {
        tokens.push(Token::Word(word));
    }
    tokens
}

/// Greedy word wrap of styled spans
///
/// Whitespace runs collapse to a single space. Words wider than a whole line
/// are split at character boundaries.
#[must_use]
pub fn wrap_spans(
    spans: &[Span<'static>],
    width: usize,
    first_prefix: Vec<Span<'static>>,
    rest_prefix: &[Span<'static>],
) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    let mut line = LineBuilder::new(first_prefix);
    let mut pending_space = false;

    for token in tokenize(spans) {
        let parts = match token {
            Token::Space => {
                pending_space = true;
                continue;
            }
            Token::Word(parts) => parts,
        };

        let word_width: usize = parts.iter().map(|(t, _)| t.width()).sum();
        let gap = usize::from(pending_space && line.has_content);
        pending_space = false;

        if line.has_content && line.width + gap + word_width > width {
            out.push(line.finish());
            line = LineBuilder::new(rest_prefix.to_vec());
        } else if gap == 1 {
            line.push(" ", Style::default());
        }

        if line.width + word_width <= width {
            for (text, style) in &parts {
                line.push(text, *style);
            }
        } else {
            for (text, style) in &parts {
                for ch in text.chars() {
                    let w = ch.width().unwrap_or(0);
                    if line.has_content && line.width + w > width {
                        out.push(line.finish());
                        line = LineBuilder::new(rest_prefix.to_vec());
                    }
                    let mut buf = [0u8; 4];
                    line.push(ch.encode_utf8(&mut buf), *style);
                }
            }
        }
    }

    if line.has_content || out.is_empty() {
        out.push(line.finish());
    }
    out
}

/// Character wrap that keeps whitespace (code)
fn hard_wrap(
    spans: &[Span<'static>],
    width: usize,
    first_prefix: Vec<Span<'static>>,
    rest_prefix: &[Span<'static>],
) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    let mut line = LineBuilder::new(first_prefix);
    for span in spans {
        for ch in span.content.chars() {
            let w = ch.width().unwrap_or(0);
            if line.has_content && line.width + w > width {
                out.push(line.finish());
                line = LineBuilder::new(rest_prefix.to_vec());
            }
            let mut buf = [0u8; 4];
            line.push(ch.encode_utf8(&mut buf), span.style);
        }
    }
    out.push(line.finish());
    out
}
