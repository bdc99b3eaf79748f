use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::App;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::Verified(result) => {
            app.session.apply_verification(&result);
        }
        AppEvent::Completed(result) => {
            app.session.finish(result);
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Log scrolling works even when input is locked
    match key.code {
        KeyCode::Esc => {
            app.should_quit = true;
            return;
        }
        KeyCode::PageUp => {
            app.session.log.scroll_up(app.session.log.view_height.max(1));
            return;
        }
        KeyCode::PageDown => {
            app.session.log.scroll_down(app.session.log.view_height.max(1));
            return;
        }
        KeyCode::Up => {
            app.session.log.scroll_up(1);
            return;
        }
        KeyCode::Down => {
            app.session.log.scroll_down(1);
            return;
        }
        _ => {}
    }

    if !app.session.input_enabled() {
        return;
    }
    if key.code == KeyCode::Enter {
        app.submit();
        return;
    }

    let session = &mut app.session;
    match key.code {
        KeyCode::Backspace => {
            if session.cursor > 0 {
                session.cursor -= 1;
                let byte_pos = char_to_byte_index(&session.input, session.cursor);
                session.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = session.input.chars().count();
            if session.cursor < char_count {
                let byte_pos = char_to_byte_index(&session.input, session.cursor);
                session.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            session.cursor = session.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = session.input.chars().count();
            session.cursor = (session.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            session.cursor = 0;
        }
        KeyCode::End => {
            session.cursor = session.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&session.input, session.cursor);
            session.input.insert(byte_pos, c);
            session.cursor += 1;
        }
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_log = app
        .log_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_log {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.session.log.scroll_down(3),
        MouseEventKind::ScrollUp => app.session.log.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crossterm::event::KeyEventState;
    use tokio::sync::mpsc;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c))).unwrap();
        }
    }

    fn locked_app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(&Config::new(), None, tx)
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        assert_eq!(char_to_byte_index("한글a", 0), 0);
        assert_eq!(char_to_byte_index("한글a", 1), 3);
        assert_eq!(char_to_byte_index("한글a", 2), 6);
        assert_eq!(char_to_byte_index("한글a", 9), 7);
    }

    #[test]
    fn test_locked_app_ignores_typing() {
        let mut app = locked_app();
        type_text(&mut app, "hello");
        handle_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert!(app.session.input.is_empty());
        assert_eq!(app.session.history.len(), 2);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = locked_app();
        handle_event(&mut app, key(KeyCode::Esc)).unwrap();
        assert!(app.should_quit);

        let mut app = locked_app();
        let ctrl_c = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        handle_event(&mut app, ctrl_c).unwrap();
        assert!(app.should_quit);
    }
}
