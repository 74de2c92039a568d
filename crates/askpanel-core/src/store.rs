//! Conversation store
//!
//! The single source of truth for one mounted widget. Every transition is
//! synchronous and total. Observers registered with [`ConversationStore::subscribe`]
//! are called after each mutation, before the mutating call returns, so a host
//! can re-render or run view side effects without the store knowing about any
//! rendering surface.

use tracing::{debug, warn};

use crate::error::SendError;
use crate::state::{ConversationState, Message, Sender};

/// Bot text appended when a send fails
pub const FALLBACK_MESSAGE: &str = "Sorry, I couldn't reach the server.";

/// Value of `last_error` after a failed send
pub const FAILURE_DESCRIPTION: &str = "Failed to fetch";

/// Which field a mutation touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Log,
    Draft,
    Pending,
    Error,
    Panel,
}

/// Result of one settled request: the answer text, or why it failed
pub type Outcome = Result<String, SendError>;

type Observer = Box<dyn FnMut(Change, &ConversationState) + Send>;

#[derive(Default)]
pub struct ConversationStore {
    state: ConversationState,
    observers: Vec<Observer>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Register an observer. It sees every change from now on.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(Change, &ConversationState) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.state.draft = text.into();
        self.notify(Change::Draft);
    }

    pub fn append_message(&mut self, sender: Sender, text: impl Into<String>) {
        self.state.log.push(Message::new(sender, text));
        self.notify(Change::Log);
    }

    /// Mark a request as in flight. Returns `false` and changes nothing when
    /// one already is.
    pub fn begin_send(&mut self) -> bool {
        if self.state.pending {
            return false;
        }
        self.state.pending = true;
        self.notify(Change::Pending);
        if !self.state.last_error.is_empty() {
            self.state.last_error.clear();
            self.notify(Change::Error);
        }
        true
    }

    /// Apply the outcome of the in-flight request.
    pub fn end_send(&mut self, outcome: Outcome) {
        if !self.state.pending {
            warn!("settling a send that was never started");
        }
        self.state.pending = false;
        self.notify(Change::Pending);

        match outcome {
            Ok(answer) => {
                debug!(len = answer.len(), "answer received");
                self.append_message(Sender::Bot, answer);
            }
            Err(err) => {
                warn!(error = %err, "send failed, showing fallback");
                self.append_message(Sender::Bot, FALLBACK_MESSAGE);
                self.state.last_error = FAILURE_DESCRIPTION.to_string();
                self.notify(Change::Error);
            }
        }
    }

    pub fn toggle_panel(&mut self) {
        self.state.panel_open = !self.state.panel_open;
        debug!(open = self.state.panel_open, "panel toggled");
        self.notify(Change::Panel);
    }

    fn notify(&mut self, change: Change) {
        for observer in &mut self.observers {
            observer(change, &self.state);
        }
    }
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .finish()
    }
}
