use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tracing::debug;

use crate::app::App;
use crate::tui::AppEvent;

/// Rows moved per mouse wheel notch
const WHEEL_STEP: i32 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(w, h) => {
            debug!(width = w, height = h, "terminal resized");
            app.scroll.request();
        }
        AppEvent::Tick => app.tick(),
        AppEvent::Settled(outcome) => app.settle(outcome),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work whether the panel is open or not
    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('o') if ctrl => {
            app.toggle_panel();
            return;
        }
        _ => {}
    }

    if app.state().panel_open {
        handle_panel_key(app, key);
    } else {
        handle_launcher_key(app, key);
    }
}

fn handle_launcher_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.toggle_panel(),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

fn handle_panel_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let page = app.log_area.map(|r| i32::from(r.height / 2)).unwrap_or(5).max(1);

    match key.code {
        KeyCode::Esc => {
            app.toggle_panel();
            return;
        }
        KeyCode::Char('l') if ctrl => {
            app.open_latest_link();
            return;
        }
        KeyCode::PageUp => {
            app.scroll.scroll_by(-page);
            return;
        }
        KeyCode::PageDown => {
            app.scroll.scroll_by(page);
            return;
        }
        KeyCode::Up => {
            app.scroll.scroll_by(-1);
            return;
        }
        KeyCode::Down => {
            app.scroll.scroll_by(1);
            return;
        }
        _ => {}
    }

    // The input is read-only while an answer is outstanding
    if app.state().pending {
        return;
    }

    match key.code {
        KeyCode::Enter if alt || key.modifiers.contains(KeyModifiers::SHIFT) => app.insert_char('\n'),
        KeyCode::Enter => {
            app.submit();
        }
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) if !ctrl => app.insert_char(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;
    let hit = |area: Option<Rect>| area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let open = app.state().panel_open;
            if (!open && hit(app.launcher_area)) || (open && hit(app.close_area)) {
                app.toggle_panel();
            }
        }
        MouseEventKind::ScrollDown if hit(app.log_area) => app.scroll.scroll_by(WHEEL_STEP),
        MouseEventKind::ScrollUp if hit(app.log_area) => app.scroll.scroll_by(-WHEEL_STEP),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use askpanel_core::{AnswerSource, Message, SendError};
    use async_trait::async_trait;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct Echo;

    #[async_trait]
    impl AnswerSource for Echo {
        async fn ask(&self, question: &str) -> Result<String, SendError> {
            Ok(format!("echo: {question}"))
        }
    }

    fn app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new("http://test/chat".into(), Arc::new(Echo), 4, tx), rx)
    }

    fn key(code: KeyCode) -> AppEvent {
        key_with(code, KeyModifiers::NONE)
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c)));
        }
    }

    fn click(app: &mut App, column: u16, row: u16) {
        handle_event(
            app,
            AppEvent::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                modifiers: KeyModifiers::NONE,
            }),
        );
    }

    #[test]
    fn test_launcher_keys() {
        let (mut app, _rx) = app();
        type_text(&mut app, "x");
        assert_eq!(app.state().draft, "", "typing does nothing while collapsed");

        handle_event(&mut app, key(KeyCode::Enter));
        assert!(app.state().panel_open);

        handle_event(&mut app, key(KeyCode::Esc));
        assert!(!app.state().panel_open);

        handle_event(&mut app, key_with(KeyCode::Char('o'), KeyModifiers::CONTROL));
        assert!(app.state().panel_open);

        handle_event(&mut app, key_with(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn test_q_types_when_open() {
        let (mut app, _rx) = app();
        app.toggle_panel();
        type_text(&mut app, "quit");
        assert_eq!(app.state().draft, "quit");
        assert!(!app.should_quit);
    }

    #[test]
    fn test_alt_enter_inserts_newline() {
        let (mut app, _rx) = app();
        app.toggle_panel();
        type_text(&mut app, "a");
        handle_event(&mut app, key_with(KeyCode::Enter, KeyModifiers::ALT));
        type_text(&mut app, "b");
        assert_eq!(app.state().draft, "a\nb");
        assert!(app.state().log.is_empty());
    }

    #[test]
    fn test_blank_enter_is_ignored() {
        let (mut app, _rx) = app();
        app.toggle_panel();
        type_text(&mut app, "   ");
        handle_event(&mut app, key(KeyCode::Enter));
        assert!(app.state().log.is_empty());
        assert!(!app.state().pending);
        assert_eq!(app.state().draft, "   ");
    }

    #[tokio::test]
    async fn test_enter_sends_and_input_locks_until_settled() {
        let (mut app, mut rx) = app();
        app.toggle_panel();
        type_text(&mut app, "Hello");
        handle_event(&mut app, key(KeyCode::Enter));

        assert!(app.state().pending);
        assert_eq!(app.state().log, vec![Message::user("Hello")]);

        type_text(&mut app, "more");
        handle_event(&mut app, key(KeyCode::Enter));
        assert_eq!(app.state().draft, "");
        assert_eq!(app.state().log.len(), 1);

        // Panel can still be toggled while waiting
        handle_event(&mut app, key(KeyCode::Esc));
        assert!(app.state().pending);

        loop {
            match rx.recv().await {
                Some(event @ AppEvent::Settled(_)) => {
                    handle_event(&mut app, event);
                    break;
                }
                Some(_) => continue,
                None => panic!("channel closed"),
            }
        }

        assert!(!app.state().pending);
        assert_eq!(
            app.state().log,
            vec![Message::user("Hello"), Message::bot("echo: Hello")]
        );
    }

    #[test]
    fn test_mouse_toggles_via_hit_areas() {
        let (mut app, _rx) = app();
        app.launcher_area = Some(Rect::new(70, 20, 8, 3));
        app.close_area = Some(Rect::new(60, 2, 5, 1));

        click(&mut app, 1, 1);
        assert!(!app.state().panel_open);
        click(&mut app, 72, 21);
        assert!(app.state().panel_open);
        click(&mut app, 72, 21);
        assert!(app.state().panel_open, "launcher is hidden while open");
        click(&mut app, 61, 2);
        assert!(!app.state().panel_open);
    }
}
