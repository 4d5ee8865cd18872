//! Key and mouse dispatch.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string edits.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global quit, any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
            app.cursor = app.input.chars().count();
        }

        // Chat scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(app.chat_height / 2);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(app.chat_height / 2);
        }
        KeyCode::Char('g') => app.chat_scroll = 0,
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        // Code block selection and copy
        KeyCode::Char('n') => app.select_next_code(),
        KeyCode::Char('p') => app.select_prev_code(),
        KeyCode::Char('c') => copy_selected_code(app),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            if let Some(history) = app.begin_submit() {
                let client = app.client.clone();
                let model = app.model.clone();
                let max_tokens = app.max_tokens;
                app.pending = Some(tokio::spawn(async move {
                    client.send(&model, max_tokens, &history).await
                }));
            }
        }
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

/// Copy the selected code block body (language tag excluded) to the
/// system clipboard.
fn copy_selected_code(app: &mut App) {
    let Some(body) = app.selected_code_body().map(str::to_string) else {
        return;
    };

    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(body)) {
        Ok(()) => app.set_status("Copied to clipboard"),
        Err(err) => {
            tracing::warn!(error = %err, "clipboard copy failed");
            app.set_status("Copy failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_to_byte_index_handles_multibyte() {
        let s = "añc";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 1), 1);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 3), 4);
        assert_eq!(char_to_byte_index(s, 99), 4);
    }

    #[test]
    fn test_editing_keys_edit_around_cursor() {
        let mut app = crate::app::App::new(
            crate::claude::ChatClient::new("test-key"),
            "claude-3-5-sonnet-20241022".to_string(),
            1024,
        );

        for c in "héllo".chars() {
            handle_editing_mode(&mut app, KeyEvent::from(KeyCode::Char(c)));
        }
        assert_eq!(app.input, "héllo");
        assert_eq!(app.cursor, 5);

        handle_editing_mode(&mut app, KeyEvent::from(KeyCode::Left));
        handle_editing_mode(&mut app, KeyEvent::from(KeyCode::Left));
        handle_editing_mode(&mut app, KeyEvent::from(KeyCode::Backspace));
        assert_eq!(app.input, "hélo");
        assert_eq!(app.cursor, 2);

        handle_editing_mode(&mut app, KeyEvent::from(KeyCode::Home));
        handle_editing_mode(&mut app, KeyEvent::from(KeyCode::Delete));
        assert_eq!(app.input, "élo");
    }
}
