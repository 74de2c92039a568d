//! UI-agnostic conversation state types
//!
//! This module contains the data structures the store mutates and every host
//! (terminal, HTML export, headless) reads. None of them depend on a UI
//! framework.

use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One entry in the conversation log. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    sender: Sender,
    text: String,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Everything one mounted widget knows about its conversation.
///
/// `log` is append-only; its order is chronological order. `last_error` is an
/// empty string when there is nothing to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    pub log: Vec<Message>,
    pub draft: String,
    pub pending: bool,
    pub last_error: String,
    pub panel_open: bool,
}

impl ConversationState {
    pub fn last_message(&self) -> Option<&Message> {
        self.log.last()
    }

    pub fn has_error(&self) -> bool {
        !self.last_error.is_empty()
    }

    /// Whether `submit` would accept the current draft
    pub fn can_submit(&self) -> bool {
        !self.pending && !self.draft.trim().is_empty()
    }
}
