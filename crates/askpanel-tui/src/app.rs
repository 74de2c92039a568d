use std::sync::Arc;

use askpanel_core::view::{links_in, AutoGrow, AutoScroll, InputSizing};
use askpanel_core::{AnswerSource, ConversationState, ConversationStore, Outcome, SendError, SendPipeline, Sender};
use ratatui::layout::Rect;
use tracing::{debug, warn};

use crate::tui::{AppEvent, EventSender};

/// Ticks per ellipsis frame while waiting for an answer
const TICKS_PER_FRAME: u8 = 4;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,

    // Conversation
    pub store: ConversationStore,
    pub pipeline: SendPipeline,
    pub endpoint: String,

    // Composer
    pub cursor: usize, // cursor position in the draft, in chars

    // View behaviors
    pub scroll: AutoScroll,
    pub grow: AutoGrow,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
    tick_count: u8,

    // Areas for mouse hit-testing (updated during render)
    pub launcher_area: Option<Rect>,
    pub close_area: Option<Rect>,
    pub log_area: Option<Rect>,

    events: EventSender,
}

impl App {
    pub fn new(
        endpoint: String,
        source: Arc<dyn AnswerSource>,
        input_max_rows: u16,
        events: EventSender,
    ) -> Self {
        let mut store = ConversationStore::new();
        let scroll = AutoScroll::new();
        let grow = AutoGrow::new(InputSizing::terminal(input_max_rows));
        store.subscribe(scroll.observer());
        store.subscribe(grow.observer());

        Self {
            should_quit: false,
            store,
            pipeline: SendPipeline::new(source),
            endpoint,
            cursor: 0,
            scroll,
            grow,
            animation_frame: 0,
            tick_count: 0,
            launcher_area: None,
            close_area: None,
            log_area: None,
            events,
        }
    }

    pub fn state(&self) -> &ConversationState {
        self.store.state()
    }

    pub fn toggle_panel(&mut self) {
        self.store.toggle_panel();
        if self.state().panel_open {
            // Reopening shows the latest entry again
            self.scroll.request();
        }
    }

    /// Send the draft if it can be sent. The request runs on its own task and
    /// comes back as [`AppEvent::Settled`].
    pub fn submit(&mut self) -> bool {
        let Some(pending) = self.pipeline.submit(&mut self.store) else {
            return false;
        };
        self.cursor = 0;

        let tx = self.events.clone();
        tokio::spawn(async move {
            let outcome = match tokio::spawn(pending.outcome()).await {
                Ok(outcome) => outcome,
                Err(err) => Err(SendError::Aborted(err.to_string())),
            };
            if tx.send(AppEvent::Settled(outcome)).is_err() {
                debug!("event loop gone before the answer arrived");
            }
        });
        true
    }

    pub fn settle(&mut self, outcome: Outcome) {
        self.store.end_send(outcome);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick(&mut self) {
        self.scroll.tick();
        if self.state().pending {
            self.tick_count = self.tick_count.wrapping_add(1);
            if self.tick_count % TICKS_PER_FRAME == 0 {
                self.animation_frame = (self.animation_frame + 1) % 3;
            }
        } else {
            self.tick_count = 0;
            self.animation_frame = 0;
        }
    }

    // Draft editing

    pub fn insert_char(&mut self, c: char) {
        let mut draft = self.state().draft.clone();
        let byte_pos = char_to_byte_index(&draft, self.cursor);
        draft.insert(byte_pos, c);
        self.cursor += 1;
        self.store.set_draft(draft);
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let mut draft = self.state().draft.clone();
            let byte_pos = char_to_byte_index(&draft, self.cursor);
            draft.remove(byte_pos);
            self.store.set_draft(draft);
        }
    }

    pub fn delete(&mut self) {
        let char_count = self.state().draft.chars().count();
        if self.cursor < char_count {
            let mut draft = self.state().draft.clone();
            let byte_pos = char_to_byte_index(&draft, self.cursor);
            draft.remove(byte_pos);
            self.store.set_draft(draft);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.state().draft.chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.state().draft.chars().count();
    }

    /// Most recent link in a bot message
    pub fn latest_link(&self) -> Option<String> {
        self.state()
            .log
            .iter()
            .rev()
            .filter(|msg| msg.sender() == Sender::Bot)
            .find_map(|msg| links_in(msg.text()).pop())
    }

    /// Open the most recent bot link in the system browser
    pub fn open_latest_link(&self) {
        let Some(link) = self.latest_link() else {
            return;
        };
        debug!(%link, "opening link");
        if let Err(e) = open::that(&link) {
            warn!(error = %e, %link, "could not open link");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askpanel_core::{Message, FALLBACK_MESSAGE};
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    /// Answers every question with a fixed result
    struct Scripted(Result<String, SendError>);

    #[async_trait]
    impl AnswerSource for Scripted {
        async fn ask(&self, _question: &str) -> Result<String, SendError> {
            self.0.clone()
        }
    }

    fn app_with(reply: Result<String, SendError>) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new("http://test/chat".into(), Arc::new(Scripted(reply)), 4, tx);
        (app, rx)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.insert_char(c);
        }
    }

    async fn next_settled(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Outcome {
        loop {
            match rx.recv().await {
                Some(AppEvent::Settled(outcome)) => return outcome,
                Some(_) => continue,
                None => panic!("channel closed before settlement"),
            }
        }
    }

    #[test]
    fn test_editing_is_utf8_safe() {
        let (mut app, _rx) = app_with(Ok(String::new()));
        type_text(&mut app, "Nestlé");
        assert_eq!(app.state().draft, "Nestlé");

        app.backspace();
        app.insert_char('e');
        assert_eq!(app.state().draft, "Nestle");

        app.cursor_home();
        app.delete();
        app.insert_char('n');
        assert_eq!(app.state().draft, "nestle");
        assert_eq!(app.cursor, 1);

        app.cursor_right();
        app.cursor_left();
        app.cursor_left();
        assert_eq!(app.cursor, 0);

        app.cursor_end();
        assert_eq!(app.cursor, 6);
        app.cursor_right();
        assert_eq!(app.cursor, 6);
    }

    #[test]
    fn test_draft_edits_drive_auto_grow() {
        let (mut app, _rx) = app_with(Ok(String::new()));
        app.grow.resize(5, "");
        assert_eq!(app.grow.height(), 3);
        type_text(&mut app, "0123456789ab");
        assert_eq!(app.grow.height(), 5);
    }

    #[tokio::test]
    async fn test_submit_round_trip_through_event_channel() {
        let (mut app, mut rx) = app_with(Ok("See https://nestle.com/faq. Thanks".into()));
        type_text(&mut app, "Where is the FAQ?");

        assert!(app.submit());
        assert_eq!(app.cursor, 0);
        assert!(app.state().pending);
        assert!(!app.submit(), "second submit while pending is ignored");

        let outcome = next_settled(&mut rx).await;
        app.settle(outcome);

        assert!(!app.state().pending);
        assert_eq!(
            app.state().log,
            vec![
                Message::user("Where is the FAQ?"),
                Message::bot("See https://nestle.com/faq. Thanks"),
            ]
        );
        assert_eq!(app.latest_link().as_deref(), Some("https://nestle.com/faq"));
    }

    #[tokio::test]
    async fn test_failure_settles_with_fallback() {
        let (mut app, mut rx) = app_with(Err(SendError::Status(500)));
        type_text(&mut app, "Hello");
        assert!(app.submit());

        let outcome = next_settled(&mut rx).await;
        app.settle(outcome);
        assert_eq!(app.state().log[1], Message::bot(FALLBACK_MESSAGE));
        assert!(app.state().has_error());
    }

    #[tokio::test]
    async fn test_closing_panel_does_not_cancel() {
        let (mut app, mut rx) = app_with(Ok("late answer".into()));
        app.toggle_panel();
        type_text(&mut app, "question");
        assert!(app.submit());
        app.toggle_panel();
        assert!(!app.state().panel_open);

        let outcome = next_settled(&mut rx).await;
        app.settle(outcome);
        assert_eq!(app.state().log.len(), 2);
        assert_eq!(app.state().log[1].text(), "late answer");
    }

    #[test]
    fn test_ellipsis_only_animates_while_pending() {
        let (mut app, _rx) = app_with(Ok(String::new()));
        for _ in 0..8 {
            app.tick();
        }
        assert_eq!(app.animation_frame, 0);

        app.store.begin_send();
        for _ in 0..TICKS_PER_FRAME {
            app.tick();
        }
        assert_eq!(app.animation_frame, 1);
    }

    #[test]
    fn test_latest_link_ignores_user_messages() {
        let (mut app, _rx) = app_with(Ok(String::new()));
        app.store.append_message(Sender::Bot, "old https://old.example");
        app.store.append_message(Sender::User, "mine https://user.example");
        assert_eq!(app.latest_link().as_deref(), Some("https://old.example"));
    }
}
