//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, mouse, paste, resize)
//! - ConversationController for session state
//! - DisplayState for rendering
//!
//! # Architecture
//!
//! The App:
//! 1. Turns key presses into draft edits and sends on the controller
//! 2. Runs each send on a spawned task so input stays responsive
//! 3. Receives `ConversationSnapshot`s from the controller's watch channel
//!    and folds them into DisplayState
//! 4. Renders based on DisplayState

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::{Frame, Terminal};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use partchat_core::{
    ChatClient, ChatTransport, ControllerOptions, ConversationController, ConversationSnapshot,
    SendOutcome,
};

use crate::display::{DisplayState, NotifyLevel};
use crate::theme;
use crate::widgets::{Transcript, TranscriptState};

/// Input box height (lines) for text wrapping
pub const INPUT_HEIGHT: u16 = 5;

/// Animation tick
const TICK: Duration = Duration::from_millis(100);

/// Lines moved per mouse wheel notch
const WHEEL_LINES: usize = 3;

/// Results of background work, tagged with the session that started it
#[derive(Debug)]
pub enum AppEvent {
    /// A send resolved
    SendFinished { session: u64, outcome: SendOutcome },
    /// The startup health probe finished
    Health { session: u64, reachable: bool },
}

/// Transcript lines for one (revision, width, spinner) combination
#[derive(Default)]
struct RenderCache {
    key: Option<(u64, usize, usize)>,
    lines: Vec<Line<'static>>,
}

/// Main application state
pub struct App<T: ChatTransport + 'static> {
    /// Is the app still running?
    running: bool,

    // === Session ===
    transport: Arc<T>,
    user_id: Option<String>,
    options: ControllerOptions,
    controller: Arc<ConversationController<Arc<T>>>,
    updates: watch::Receiver<ConversationSnapshot>,
    /// Bumped by Ctrl+N so late results from the old session are dropped
    session: u64,
    /// Spawned sends and probes for the current session
    tasks: Vec<JoinHandle<()>>,

    // === Background results ===
    app_tx: mpsc::UnboundedSender<AppEvent>,
    app_rx: mpsc::UnboundedReceiver<AppEvent>,

    // === Display ===
    /// Display state (derived from controller snapshots)
    pub display: DisplayState,
    transcript: TranscriptState,
    cache: RenderCache,
}

impl<T: ChatTransport + 'static> App<T> {
    /// Create the app around a transport
    pub fn new(transport: T, user_id: Option<String>, options: ControllerOptions) -> Self {
        let transport = Arc::new(transport);
        let controller = Arc::new(ConversationController::new(
            ChatClient::new(Arc::clone(&transport)).with_user_id(user_id.clone()),
            options.clone(),
        ));
        let mut updates = controller.subscribe();
        let (app_tx, app_rx) = mpsc::unbounded_channel();

        let mut display = DisplayState::new();
        display.apply_snapshot(&updates.borrow_and_update());

        Self {
            running: true,
            transport,
            user_id,
            options,
            controller,
            updates,
            session: 0,
            tasks: Vec::new(),
            app_tx,
            app_rx,
            display,
            transcript: TranscriptState::default(),
            cache: RenderCache::default(),
        }
    }

    /// Controller for the current session
    pub fn controller(&self) -> &Arc<ConversationController<Arc<T>>> {
        &self.controller
    }

    /// Whether the event loop should keep going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Transcript scroll state
    pub fn transcript_state(&self) -> &TranscriptState {
        &self.transcript
    }

    /// Main event loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();
        let mut ticker = tokio::time::interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.probe_backend();

        // Render initial frame immediately so user sees UI
        terminal.draw(|frame| self.render(frame))?;

        while self.running {
            tokio::select! {
                biased;

                // Terminal events - highest priority
                maybe_event = event_stream.next() => match maybe_event {
                    Some(Ok(event)) => self.handle_event(&event),
                    Some(Err(e)) => tracing::warn!(error = %e, "Terminal event error"),
                    None => self.running = false,
                },

                changed = self.updates.changed() => {
                    if changed.is_ok() {
                        self.apply_latest();
                    }
                }

                Some(event) = self.app_rx.recv() => self.handle_app_event(event),

                _ = ticker.tick() => self.display.tick(),
            }

            terminal.draw(|frame| self.render(frame))?;
        }

        self.abort_tasks();
        Ok(())
    }

    /// Handle one terminal event
    pub fn handle_event(&mut self, event: &Event) {
        match event {
            // Only handle Press events (not Release or Repeat)
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(*key),
            Event::Mouse(mouse) => self.handle_mouse(*mouse),
            Event::Paste(text) => {
                let text = text.replace("\r\n", "\n").replace('\r', "\n");
                self.controller.edit_draft(|draft| draft.push_str(&text));
            }
            // Layout is recomputed on every draw
            _ => {}
        }
        self.sync();
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.running = false,
            KeyCode::Char('c') if ctrl => self.running = false,
            KeyCode::Char('n') if ctrl => self.new_session(),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                self.controller.edit_draft(|draft| draft.push('\n'));
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Char(_) if ctrl => {}
            KeyCode::Char(c) => self.controller.edit_draft(|draft| draft.push(c)),
            KeyCode::Backspace => {
                self.controller.edit_draft(|draft| {
                    draft.pop();
                });
            }
            KeyCode::PageUp => {
                let page = self.transcript.page();
                self.transcript.scroll_up(page);
            }
            KeyCode::PageDown => {
                let page = self.transcript.page();
                self.transcript.scroll_down(page);
            }
            KeyCode::Home if ctrl => self.transcript.scroll_to_top(),
            KeyCode::End if ctrl => self.transcript.scroll_to_bottom(),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.transcript.scroll_up(WHEEL_LINES),
            MouseEventKind::ScrollDown => self.transcript.scroll_down(WHEEL_LINES),
            _ => {}
        }
    }

    /// Handle a result from background work
    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::SendFinished { session, outcome } if session == self.session => {
                tracing::debug!(?outcome, "Send finished");
                self.display.apply_outcome(&outcome);
            }
            AppEvent::Health { session, reachable } if session == self.session => {
                self.display.set_backend(reachable);
            }
            AppEvent::SendFinished { .. } | AppEvent::Health { .. } => {
                tracing::debug!("Dropping result from a previous session");
            }
        }
        self.sync();
    }

    /// Fold the latest snapshot into display state
    pub fn sync(&mut self) {
        if matches!(self.updates.has_changed(), Ok(true)) {
            self.apply_latest();
        }
    }

    /// New messages snap the transcript back to the bottom
    fn apply_latest(&mut self) {
        let snapshot = self.updates.borrow_and_update().clone();
        if self.display.apply_snapshot(&snapshot) {
            self.transcript.scroll_to_bottom();
        }
    }

    /// Take the draft now and wait for the reply on a background task
    fn submit(&mut self) {
        self.tasks.retain(|task| !task.is_finished());

        let pending = match self.controller.begin_submit() {
            Ok(pending) => pending,
            Err(outcome) => {
                tracing::debug!(?outcome, "Send not started");
                self.display.apply_outcome(&outcome);
                return;
            }
        };

        let controller = Arc::clone(&self.controller);
        let tx = self.app_tx.clone();
        let session = self.session;
        self.tasks.push(tokio::spawn(async move {
            let outcome = controller.complete(pending).await;
            let _ = tx.send(AppEvent::SendFinished { session, outcome });
        }));
    }

    /// Ask the backend whether it is up
    pub fn probe_backend(&mut self) {
        let controller = Arc::clone(&self.controller);
        let tx = self.app_tx.clone();
        let session = self.session;
        self.tasks.push(tokio::spawn(async move {
            let reachable = controller.client().health_check().await;
            let _ = tx.send(AppEvent::Health { session, reachable });
        }));
    }

    /// Start over with a fresh controller
    pub fn new_session(&mut self) {
        self.abort_tasks();
        self.session += 1;

        self.controller = Arc::new(ConversationController::new(
            ChatClient::new(Arc::clone(&self.transport)).with_user_id(self.user_id.clone()),
            self.options.clone(),
        ));
        self.updates = self.controller.subscribe();

        let backend = self.display.backend;
        self.display = DisplayState {
            backend,
            ..DisplayState::default()
        };
        self.display.apply_snapshot(&self.updates.borrow_and_update());
        self.display.notify(NotifyLevel::Info, "Started a new conversation");
        self.transcript = TranscriptState::default();
        self.cache = RenderCache::default();

        tracing::info!(session = self.session, "New session");
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    /// Wait for background work and apply its results
    pub async fn settle(&mut self) {
        for task in std::mem::take(&mut self.tasks) {
            let _ = task.await;
        }
        while let Ok(event) = self.app_rx.try_recv() {
            self.handle_app_event(event);
        }
        self.sync();
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Draw the whole screen
    pub fn render(&mut self, frame: &mut Frame) {
        let [conversation, input, status] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.refresh_transcript(conversation.width as usize);
        frame.render_stateful_widget(
            Transcript::new(&self.cache.lines),
            conversation,
            &mut self.transcript,
        );

        self.render_input(frame.buffer_mut(), input);

        let (text, style) = self.display.status(self.transcript.scroll_offset);
        frame
            .buffer_mut()
            .set_stringn(status.x, status.y, text, status.width as usize, style);
    }

    fn refresh_transcript(&mut self, width: usize) {
        let key = (self.display.revision, width, self.display.spinner_frame);
        if self.cache.key != Some(key) {
            self.cache.lines = self.display.transcript_lines(width);
            self.cache.key = Some(key);
        }
    }

    /// Render input box
    fn render_input(&self, buf: &mut Buffer, area: Rect) {
        if area.height == 0 {
            return;
        }
        let separator = "-".repeat(area.width as usize);
        buf.set_string(area.x, area.y, &separator, theme::dim());

        let text_height = area.height.saturating_sub(1) as usize;
        let text_width = area.width.saturating_sub(1) as usize;
        if text_width < 5 || text_height < 1 {
            return;
        }

        let wrapped = self.display.input_lines(text_width);
        let skip = wrapped.len().saturating_sub(text_height);
        let style = Style::default().fg(theme::USER_GREEN);
        for (i, line) in wrapped.iter().skip(skip).enumerate() {
            buf.set_string(area.x, area.y + 1 + i as u16, line, style);
        }

        if skip > 0 {
            buf.set_string(
                area.x + area.width.saturating_sub(3),
                area.y,
                "^",
                Style::default().fg(theme::WARN_AMBER),
            );
        }
    }
}

impl<T: ChatTransport + 'static> Drop for App<T> {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}
