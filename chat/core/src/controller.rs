//! Conversation Controller
//!
//! The single authority over a chat session's state:
//! - the append-only [`Conversation`]
//! - the input draft
//! - the sending flag
//!
//! It drives the request/response cycle against a [`ChatClient`] and publishes
//! an immutable [`ConversationSnapshot`] after every mutation.
//!
//! # Send Lifecycle
//!
//! ```text
//!   Idle ──send_message(text)──▶ Sending ──reply (or fallback)──▶ Idle
//!          append user message             append assistant message
//!          clear draft, flag = true        flag = false
//! ```
//!
//! Exactly one suspension point exists per send: the network round trip.
//! State is held in a mutex that is never locked across that await, so the
//! controller can be shared as `Arc<ConversationController<_>>` between the
//! input handler and spawned send tasks.
//!
//! # Overlapping Sends
//!
//! What happens when a send starts while another is in flight is decided by
//! [`OverlapPolicy`]. The default refuses the second send outright; the
//! alternative accepts it and discards any reply that a newer request has
//! overtaken.

use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::client::{ChatClient, ChatTransport};
use crate::conversation::{Conversation, ConversationSnapshot};
use crate::messages::{Message, DEFAULT_GREETING};
use crate::security::{InputLimits, InputRejection};

/// Rule for a send attempted while another request is outstanding
///
/// Config files, environment variables and flags all parse through
/// [`FromStr`], so they accept the same spellings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OverlapPolicy {
    /// Refuse the new send; nothing changes
    #[default]
    RejectWhileSending,
    /// Accept it; only the newest request's reply is appended
    LatestWins,
}

impl OverlapPolicy {
    /// Canonical configuration name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RejectWhileSending => "reject",
            Self::LatestWins => "latest-wins",
        }
    }
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" | "reject-while-sending" => Ok(Self::RejectWhileSending),
            "latest-wins" | "latest" => Ok(Self::LatestWins),
            other => Err(format!(
                "unknown overlap policy '{other}' (expected 'reject' or 'latest-wins')"
            )),
        }
    }
}

impl TryFrom<String> for OverlapPolicy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OverlapPolicy> for String {
    fn from(policy: OverlapPolicy) -> Self {
        policy.as_str().to_string()
    }
}

impl std::fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construction options for a controller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Assistant greeting to seed the conversation with (`None` = start empty)
    pub greeting: Option<String>,
    /// Behaviour for overlapping sends
    pub overlap_policy: OverlapPolicy,
    /// Limits on outgoing messages
    pub limits: InputLimits,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            greeting: Some(DEFAULT_GREETING.to_string()),
            overlap_policy: OverlapPolicy::default(),
            limits: InputLimits::default(),
        }
    }
}

impl ControllerOptions {
    /// Options for a conversation without a seeded greeting
    #[must_use]
    pub fn unseeded() -> Self {
        Self {
            greeting: None,
            ..Self::default()
        }
    }

    /// Set the overlap policy
    #[must_use]
    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }

    /// Set the greeting
    #[must_use]
    pub fn with_greeting(mut self, greeting: Option<String>) -> Self {
        self.greeting = greeting;
        self
    }

    /// Set the input limits
    #[must_use]
    pub fn with_limits(mut self, limits: InputLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Result of a [`ConversationController::send_message`] call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Input was blank; nothing happened
    Ignored,
    /// Another request is in flight and the policy refuses overlap
    Busy,
    /// Input failed validation; nothing happened
    Rejected(InputRejection),
    /// The assistant message (possibly the fallback) was appended
    Delivered(Message),
    /// A newer request was issued before this reply arrived; it was dropped
    Superseded,
}

impl SendOutcome {
    /// Whether an assistant message was appended
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }

    /// Whether the input was accepted and a request issued
    #[must_use]
    pub fn was_sent(&self) -> bool {
        matches!(self, Self::Delivered(_) | Self::Superseded)
    }
}

/// Mutable state guarded by the controller's mutex
struct ControllerState {
    conversation: Conversation,
    draft: String,
    /// Requests issued and not yet resolved
    in_flight: usize,
    /// Sequence number of the most recently issued request
    latest_seq: u64,
    /// Snapshot publication counter
    revision: u64,
}

impl ControllerState {
    fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            messages: self.conversation.messages().to_vec(),
            sending: self.in_flight > 0,
            draft: self.draft.clone(),
            revision: self.revision,
        }
    }
}

/// State and its publication channel, shared with outstanding sends
struct Shared {
    /// Never locked across an await
    state: Mutex<ControllerState>,
    updates: watch::Sender<ConversationSnapshot>,
}

impl Shared {
    /// Bump the revision and push a fresh snapshot to subscribers
    fn publish(&self, state: &mut ControllerState) {
        state.revision += 1;
        self.updates.send_replace(state.snapshot());
    }
}

/// A send whose user message is already on the transcript
///
/// Created synchronously by [`ConversationController::begin_send`] or
/// [`ConversationController::begin_submit`] and driven to the reply by
/// [`ConversationController::complete`] on the same controller. It owns no
/// borrow, so it can move into a spawned task. Dropping it unfinished lowers
/// the sending flag.
#[must_use = "the reply is only appended by `ConversationController::complete`"]
pub struct PendingSend {
    text: String,
    history: Vec<Message>,
    seq: u64,
    guard: SendingGuard,
}

impl PendingSend {
    /// The user message as it was appended
    pub fn message(&self) -> &str {
        &self.text
    }

    /// History carried by the request, ending with the user message
    pub fn history(&self) -> &[Message] {
        &self.history
    }
}

impl std::fmt::Debug for PendingSend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSend")
            .field("text", &self.text)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

/// Owner of one chat session's conversation, draft and sending flag
pub struct ConversationController<T: ChatTransport> {
    /// Backend client
    client: ChatClient<T>,
    /// Construction options
    options: ControllerOptions,
    /// Session state
    shared: Arc<Shared>,
}

impl<T: ChatTransport> ConversationController<T> {
    /// Create a controller for a fresh session
    pub fn new(client: ChatClient<T>, options: ControllerOptions) -> Self {
        let conversation = match options.greeting {
            Some(ref greeting) => Conversation::seeded(greeting.clone()),
            None => Conversation::new(),
        };
        let state = ControllerState {
            conversation,
            draft: String::new(),
            in_flight: 0,
            latest_seq: 0,
            revision: 0,
        };
        let (updates, _) = watch::channel(state.snapshot());

        Self {
            client,
            options,
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                updates,
            }),
        }
    }

    /// Create a controller with default options and the given greeting
    pub fn with_greeting(client: ChatClient<T>, greeting: Option<String>) -> Self {
        Self::new(client, ControllerOptions::default().with_greeting(greeting))
    }

    /// The backend client
    pub fn client(&self) -> &ChatClient<T> {
        &self.client
    }

    /// The active overlap policy
    pub fn overlap_policy(&self) -> OverlapPolicy {
        self.options.overlap_policy
    }

    /// Current state as an immutable value
    pub fn snapshot(&self) -> ConversationSnapshot {
        self.shared.state.lock().snapshot()
    }

    /// Receive a new snapshot after every mutation
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Copy of the transcript
    pub fn messages(&self) -> Vec<Message> {
        self.shared.state.lock().conversation.messages().to_vec()
    }

    /// Whether a request is outstanding
    pub fn is_sending(&self) -> bool {
        self.shared.state.lock().in_flight > 0
    }

    /// Current draft text
    pub fn draft(&self) -> String {
        self.shared.state.lock().draft.clone()
    }

    /// Replace the draft
    pub fn set_draft(&self, text: impl Into<String>) {
        let mut state = self.shared.state.lock();
        state.draft = text.into();
        self.shared.publish(&mut state);
    }

    /// Edit the draft in place (keystrokes)
    pub fn edit_draft(&self, edit: impl FnOnce(&mut String)) {
        let mut state = self.shared.state.lock();
        edit(&mut state.draft);
        self.shared.publish(&mut state);
    }

    /// History that a send of `new_user_message` would carry right now
    ///
    /// Every message except a seeded greeting, followed by the new message.
    pub fn history_payload(&self, new_user_message: &str) -> Vec<Message> {
        let state = self.shared.state.lock();
        let mut history = state.conversation.history().to_vec();
        history.push(Message::user(new_user_message));
        history
    }

    /// Send whatever is in the draft
    pub async fn submit_draft(&self) -> SendOutcome {
        match self.begin_submit() {
            Ok(pending) => self.complete(pending).await,
            Err(outcome) => outcome,
        }
    }

    /// Send a user message and append the assistant's reply
    ///
    /// Blank input is ignored. Otherwise the user message is appended and
    /// published before the request goes out, and the reply (or the fallback)
    /// is appended when it resolves. The sending flag is released on every
    /// exit path, including when this future is dropped mid-flight.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        match self.begin_send(text) {
            Ok(pending) => self.complete(pending).await,
            Err(outcome) => outcome,
        }
    }

    /// Take the draft and start sending it, without waiting for the reply
    ///
    /// The draft is read, cleared and appended as the user message under one
    /// lock, so keystrokes after this call belong to the next draft. A send
    /// that does not start returns its outcome and leaves the draft alone.
    pub fn begin_submit(&self) -> Result<PendingSend, SendOutcome> {
        let mut state = self.shared.state.lock();
        let text = state.draft.clone();
        self.start(&mut state, &text)
    }

    /// Start sending `text` without waiting for the reply
    pub fn begin_send(&self, text: &str) -> Result<PendingSend, SendOutcome> {
        let mut state = self.shared.state.lock();
        self.start(&mut state, text)
    }

    /// Wait for the reply to a started send and append it
    pub async fn complete(&self, pending: PendingSend) -> SendOutcome {
        let PendingSend {
            text,
            history,
            seq,
            guard,
        } = pending;

        let reply = self.client.send(&text, &history).await;

        let mut state = self.shared.state.lock();
        let outcome = if state.latest_seq == seq {
            state.conversation.push(reply.clone());
            SendOutcome::Delivered(reply)
        } else {
            tracing::debug!(
                seq = seq,
                latest = state.latest_seq,
                "Dropping reply overtaken by a newer request"
            );
            SendOutcome::Superseded
        };
        guard.release(&mut state);
        self.shared.publish(&mut state);
        outcome
    }

    /// Validate, apply the overlap policy and do the optimistic update
    fn start(&self, state: &mut ControllerState, text: &str) -> Result<PendingSend, SendOutcome> {
        if text.trim().is_empty() {
            return Err(SendOutcome::Ignored);
        }
        if let Err(rejection) = self.options.limits.validate(text) {
            tracing::warn!(reason = %rejection, "Rejected outgoing message");
            return Err(SendOutcome::Rejected(rejection));
        }
        if state.in_flight > 0 && self.options.overlap_policy == OverlapPolicy::RejectWhileSending {
            tracing::debug!("Send refused, a request is already in flight");
            return Err(SendOutcome::Busy);
        }

        state.conversation.push(Message::user(text));
        state.draft.clear();
        state.in_flight += 1;
        state.latest_seq += 1;
        self.shared.publish(state);

        Ok(PendingSend {
            text: text.to_string(),
            history: state.conversation.history().to_vec(),
            seq: state.latest_seq,
            guard: SendingGuard {
                shared: Arc::clone(&self.shared),
                armed: true,
            },
        })
    }
}

/// Keeps the in-flight count honest if a send is dropped mid-request
struct SendingGuard {
    shared: Arc<Shared>,
    armed: bool,
}

impl SendingGuard {
    /// Release under an already-held lock; the caller publishes
    fn release(mut self, state: &mut ControllerState) {
        state.in_flight = state.in_flight.saturating_sub(1);
        self.armed = false;
    }
}

impl Drop for SendingGuard {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.shared.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            self.shared.publish(&mut state);
        }
    }
}
