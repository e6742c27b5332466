use anyhow::{Result, anyhow};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use std::path::{Path, PathBuf};
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
            poll_request(app).await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global quit, regardless of mode
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

        // Focus the input
        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
            app.cursor = app.draft.chars().count();
        }

        // Chat scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }
        KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::Char('G') => app.scroll_to_bottom(),

        // Follow-up suggestions from the newest assistant message
        KeyCode::Char(c @ '1'..='9') => {
            let idx = (c as usize) - ('1' as usize);
            let question = app
                .latest_follow_ups()
                .and_then(|m| m.follow_ups.get(idx))
                .cloned();
            if let Some(question) = question {
                if let Some(prompt) = app.follow_up(&question) {
                    spawn_request(app, prompt);
                }
            }
        }

        // Save the newest generated image next to the working directory
        KeyCode::Char('s') => {
            let found = app
                .latest_image()
                .map(|m| (m.id, m.image.clone().unwrap_or_default()));
            if let Some((id, encoded)) = found {
                match save_image(Path::new("."), id, &encoded) {
                    Ok(path) => app.status = Some(format!("saved {}", path.display())),
                    Err(err) => app.status = Some(format!("image save failed: {err}")),
                }
            }
        }

        KeyCode::Char('c') => app.clear_conversation(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            if let Some(prompt) = app.begin_submit() {
                spawn_request(app, prompt);
            }
        }
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.draft, app.cursor);
                app.draft.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.draft.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.draft, app.cursor);
                app.draft.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.draft.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.draft.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.draft, app.cursor);
            app.draft.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

/// Dispatch the accepted prompt on the runtime; the handle is parked in the
/// app state and harvested by `poll_request` on tick.
fn spawn_request(app: &mut App, prompt: String) {
    let client = app.client.clone();
    app.request_task = Some(tokio::spawn(async move {
        client.generate(&prompt).await
    }));
}

/// Harvest the outstanding request once its task has finished. The request
/// itself is never cancelled or retried; it runs to completion or failure.
async fn poll_request(app: &mut App) {
    let finished = app
        .request_task
        .as_ref()
        .map(|task| task.is_finished())
        .unwrap_or(false);
    if !finished {
        return;
    }

    if let Some(task) = app.request_task.take() {
        let outcome = match task.await {
            Ok(result) => result,
            Err(err) => Err(anyhow!("request task failed: {err}")),
        };
        app.finish_request(outcome);
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            app.scroll_down();
            app.scroll_down();
            app.scroll_down();
        }
        MouseEventKind::ScrollUp => {
            app.scroll_up();
            app.scroll_up();
            app.scroll_up();
        }
        _ => {}
    }
}

fn save_image(dir: &Path, id: u64, encoded: &str) -> Result<PathBuf> {
    let bytes = BASE64.decode(encoded.trim())?;
    let path = dir.join(format!("chat-image-{id}.png"));
    std::fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_to_byte_index_handles_multibyte_text() {
        let s = "héllo";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 99), s.len());
    }

    #[test]
    fn save_image_writes_the_decoded_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_image(dir.path(), 7, "aGVsbG8=").unwrap();

        assert_eq!(path.file_name().unwrap(), "chat-image-7.png");
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn save_image_rejects_a_malformed_payload() {
        let dir = tempfile::tempdir().unwrap();
        assert!(save_image(dir.path(), 1, "not base64!!").is_err());
    }
}
