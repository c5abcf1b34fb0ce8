use anyhow::{Context, Result};
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers, MouseButton, MouseEventKind};

use crate::app::{App, AppMode};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub async fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => {
        app.should_quit = true;
        return Ok(());
      }
      KeyCode::Char('t') => {
        app.next_theme();
        return Ok(());
      }
      KeyCode::Char('r') => {
        app.trigger_load();
        return Ok(());
      }
      KeyCode::Char('s') => {
        app.stop_playback().await.context("Failed to stop playback")?;
        return Ok(());
      }
      _ => {}
    }
  }

  match app.mode {
    AppMode::Search => handle_search_key(app, key).await,
    AppMode::Browse => handle_browse_key(app, key).await,
  }
  Ok(())
}

async fn handle_search_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  let mut edited = false;
  match key.code {
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.query, app.cursor_position);
      app.query.insert(byte_idx, c);
      app.cursor_position += 1;
      edited = true;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.query, app.cursor_position);
        app.query.remove(byte_idx);
        edited = true;
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.query.chars().count() {
        let byte_idx = char_to_byte_index(&app.query, app.cursor_position);
        app.query.remove(byte_idx);
        edited = true;
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.query.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.query.chars().count();
    }
    KeyCode::Esc => {
      if !app.query.is_empty() {
        app.query.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
        edited = true;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down | KeyCode::Tab | KeyCode::Enter => {
      if app.gallery.visible_len() > 0 {
        app.mode = AppMode::Browse;
      }
    }
    _ => {}
  }

  // No debounce: every edit re-filters and re-selects.
  if edited {
    app.on_query_changed().await;
  }
}

async fn handle_browse_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => {
      app.activate_selected().await;
    }
    KeyCode::Char(' ') => {
      app.toggle_pause().await;
    }
    KeyCode::Down | KeyCode::Char('j') => {
      app.select_next();
    }
    KeyCode::Up | KeyCode::Char('k') => {
      app.select_previous();
    }
    KeyCode::Char('/') | KeyCode::Tab | KeyCode::Esc => {
      app.mode = AppMode::Search;
    }
    KeyCode::Char('q') => {
      app.should_quit = true;
    }
    _ => {}
  }
}

/// Left click on a card activates it; the wheel moves the cursor.
pub async fn handle_mouse_event(app: &mut App, mouse: event::MouseEvent) {
  match mouse.kind {
    MouseEventKind::Down(MouseButton::Left) => {
      if let Some(index) = app.card_at(mouse.column, mouse.row) {
        app.mode = AppMode::Browse;
        app.activate(index).await;
      }
    }
    MouseEventKind::ScrollDown => app.select_next(),
    MouseEventKind::ScrollUp => app.select_previous(),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::manifest::{ManifestSource, Video};
  use ratatui::crossterm::event::{KeyEvent, KeyEventKind, KeyEventState, MouseEvent};
  use ratatui::layout::Rect;

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0);
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6);
  }

  #[test]
  fn char_to_byte_empty() {
    assert_eq!(char_to_byte_index("", 0), 0);
    assert_eq!(char_to_byte_index("", 5), 0);
  }

  // --- Key and mouse bindings ---

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent { code, modifiers: KeyModifiers::NONE, kind: KeyEventKind::Press, state: KeyEventState::NONE }
  }

  fn gallery_app() -> App {
    let source = ManifestSource::Local("unused.json".into());
    let mut app = App::new(source, "vgal-test-no-player", reqwest::Client::new(), Config::default());
    let videos = ["Apple.mp4", "banana.mp4", "grape.mp4"]
      .iter()
      .map(|name| Video { filename: Some(name.to_string()), url: Some(format!("file:///{}", name)), ..Video::default() })
      .collect();
    app.gallery.load(videos);
    app.list_state.select(Some(0));
    app
  }

  #[tokio::test]
  async fn every_keystroke_refilters() {
    let mut app = gallery_app();
    handle_key_event(&mut app, key(KeyCode::Char('g'))).await.unwrap();
    assert_eq!(app.gallery.visible_len(), 1);
    handle_key_event(&mut app, key(KeyCode::Backspace)).await.unwrap();
    assert_eq!(app.gallery.visible_len(), 3);
    handle_key_event(&mut app, key(KeyCode::Char('x'))).await.unwrap();
    assert_eq!(app.gallery.visible_len(), 0);
    assert_eq!(app.list_state.selected(), None);
  }

  #[tokio::test]
  async fn esc_clears_query_then_quits() {
    let mut app = gallery_app();
    handle_key_event(&mut app, key(KeyCode::Char('z'))).await.unwrap();
    handle_key_event(&mut app, key(KeyCode::Esc)).await.unwrap();
    assert!(app.query.is_empty());
    assert_eq!(app.gallery.visible_len(), 3);
    assert!(!app.should_quit);
    handle_key_event(&mut app, key(KeyCode::Esc)).await.unwrap();
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn browse_enter_activates_cursor_card() {
    let mut app = gallery_app();
    handle_key_event(&mut app, key(KeyCode::Tab)).await.unwrap();
    assert_eq!(app.mode, AppMode::Browse);
    handle_key_event(&mut app, key(KeyCode::Char('j'))).await.unwrap();
    handle_key_event(&mut app, key(KeyCode::Char('j'))).await.unwrap();
    handle_key_event(&mut app, key(KeyCode::Enter)).await.unwrap();
    assert_eq!(app.gallery.active(), Some(2));
    handle_key_event(&mut app, key(KeyCode::Char('/'))).await.unwrap();
    assert_eq!(app.mode, AppMode::Search);
  }

  #[tokio::test]
  async fn ctrl_c_quits() {
    let mut app = gallery_app();
    let event = KeyEvent { modifiers: KeyModifiers::CONTROL, ..key(KeyCode::Char('c')) };
    handle_key_event(&mut app, event).await.unwrap();
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn click_activates_card() {
    let mut app = gallery_app();
    app.list_area = Some(Rect { x: 0, y: 0, width: 30, height: 10 });
    let click = MouseEvent {
      kind: MouseEventKind::Down(MouseButton::Left),
      column: 4,
      row: 3,
      modifiers: KeyModifiers::NONE,
    };
    handle_mouse_event(&mut app, click).await;
    assert_eq!(app.gallery.active(), Some(1));
    assert_eq!(app.mode, AppMode::Browse);
  }
}
