use crate::state::{ConversationState, Sender};

use super::links::{linkify, Segment};

pub const THINKING_TEXT: &str = "Thinking";
pub const ERROR_TITLE: &str = "ERROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

impl From<Sender> for Align {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::User => Align::Right,
            Sender::Bot => Align::Left,
        }
    }
}

/// One renderable row of the message area, top to bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewItem {
    Message {
        sender: Sender,
        align: Align,
        segments: Vec<Segment>,
    },
    Thinking,
    ErrorBanner(String),
}

/// Build the message area for `state`: the log oldest first, then the
/// thinking indicator while pending, then the error banner if there is one.
/// Only bot text is scanned for links.
pub fn build_view(state: &ConversationState) -> Vec<ViewItem> {
    let mut items: Vec<ViewItem> = state
        .log
        .iter()
        .map(|msg| {
            let segments = match msg.sender() {
                Sender::Bot => linkify(msg.text()),
                Sender::User if msg.text().is_empty() => Vec::new(),
                Sender::User => vec![Segment::Text(msg.text().to_string())],
            };
            ViewItem::Message {
                sender: msg.sender(),
                align: msg.sender().into(),
                segments,
            }
        })
        .collect();

    if state.pending {
        items.push(ViewItem::Thinking);
    }
    if state.has_error() {
        items.push(ViewItem::ErrorBanner(state.last_error.clone()));
    }

    items
}
