use anyhow::Result;
use ratatui::{layout::Rect, widgets::ListState};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::constants::constants;
use crate::gallery::{Gallery, PlayerCommand};
use crate::manifest::{ManifestError, ManifestSource, Video, fetch_manifest};
use crate::player::VideoPlayer;
use crate::theme::{self, THEMES};

// --- Types ---

pub type LoadResult = std::result::Result<Vec<Video>, ManifestError>;

/// Rows each card occupies in the list.
pub const CARD_HEIGHT: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// Typing in the search field; every edit re-filters.
  Search,
  /// Moving the cursor over the card list.
  Browse,
}

pub struct App {
  pub query: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub mode: AppMode,
  pub theme_index: usize,
  pub gallery: Gallery,
  /// Keyboard cursor over the filtered list. Independent of the active video.
  pub list_state: ListState,
  /// Where the card list was last drawn, for mapping mouse clicks to cards.
  pub list_area: Option<Rect>,
  pub player: VideoPlayer,
  pub source: ManifestSource,
  http_client: Client,
  load_rx: Option<oneshot::Receiver<LoadResult>>,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  /// Informational message, lower priority than status/error.
  pub info_message: Option<String>,
  pub should_quit: bool,
  error_time: Option<Instant>,
  config: Config,
}

impl App {
  pub fn new(source: ManifestSource, player_command: &str, http_client: Client, config: Config) -> Self {
    let theme_index = config.theme_name.as_deref().and_then(theme::index_of).unwrap_or(0);
    Self {
      query: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      mode: AppMode::Search,
      theme_index,
      gallery: Gallery::new(),
      list_state: ListState::default(),
      list_area: None,
      player: VideoPlayer::new(player_command),
      source,
      http_client,
      load_rx: None,
      last_error: None,
      status_message: None,
      info_message: None,
      should_quit: false,
      error_time: None,
      config,
    }
  }

  pub fn theme(&self) -> &'static theme::Theme {
    // Safety: theme_index only comes from theme::index_of or modular arithmetic in next_theme().
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  pub fn is_loading(&self) -> bool {
    self.load_rx.is_some()
  }

  // --- Manifest loading ---

  /// Start loading the manifest in the background. Ignored while a load is already in flight.
  pub fn trigger_load(&mut self) {
    if self.is_loading() {
      debug!("load already in flight, ignoring");
      return;
    }
    info!(source = %self.source, "manifest load triggered");
    self.clear_error();
    self.status_message = Some(format!("Loading {}…", self.source));

    let client = self.http_client.clone();
    let source = self.source.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(fetch_manifest(&client, &source).await);
    });
    self.load_rx = Some(rx);
  }

  pub async fn check_pending(&mut self) {
    if let Some(mut rx) = self.load_rx.take() {
      match rx.try_recv() {
        Ok(Ok(videos)) => {
          self.status_message = None;
          let command = self.gallery.load(videos);
          self.query.clear();
          self.cursor_position = 0;
          self.input_scroll = 0;
          self.sync_selection();
          self.apply(command).await;
        }
        Ok(Err(e)) => {
          self.status_message = None;
          error!(err = %e, source = %self.source, "manifest load failed");
          self.gallery.load_failed();
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.load_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          error!(source = %self.source, "manifest load task ended without a result");
          self.gallery.load_failed();
        }
      }
    }

    self.player.check_status();
  }

  // --- Gallery operations ---

  /// Hand a gallery command to the player. Playback failures are reported, never propagated.
  async fn apply(&mut self, command: Option<PlayerCommand>) {
    let Some(command) = command else { return };
    self.info_message = self.player.apply(command).await.map(|msg| format!("Playback unavailable: {}", msg));
  }

  /// Re-run the search after every edit of the query.
  pub async fn on_query_changed(&mut self) {
    let command = self.gallery.search(&self.query);
    self.sync_selection();
    self.apply(command).await;
  }

  /// Activate the card at `index` in the filtered list.
  pub async fn activate(&mut self, index: usize) {
    let command = self.gallery.activate(index);
    if command.is_some() {
      self.list_state.select(Some(index));
    }
    self.apply(command).await;
  }

  pub async fn activate_selected(&mut self) {
    if let Some(index) = self.list_state.selected() {
      self.activate(index).await;
    }
  }

  /// Put the cursor on the active card, or the first card, or nowhere when the list is empty.
  fn sync_selection(&mut self) {
    let selected = self.gallery.active().or((self.gallery.visible_len() > 0).then_some(0));
    self.list_state.select(selected);
  }

  pub fn select_next(&mut self) {
    let count = self.gallery.visible_len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| (i + 1) % count);
      self.list_state.select(Some(i));
    }
  }

  pub fn select_previous(&mut self) {
    let count = self.gallery.visible_len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
      self.list_state.select(Some(i));
    }
  }

  /// Map a terminal cell to the card drawn there, if any.
  pub fn card_at(&self, column: u16, row: u16) -> Option<usize> {
    let area = self.list_area?;
    // Cards live inside a one-cell border.
    let inner =
      Rect { x: area.x + 1, y: area.y + 1, width: area.width.saturating_sub(2), height: area.height.saturating_sub(2) };
    if column < inner.x || column >= inner.x + inner.width || row < inner.y || row >= inner.y + inner.height {
      return None;
    }
    let index = self.list_state.offset() + ((row - inner.y) / CARD_HEIGHT) as usize;
    (index < self.gallery.visible_len()).then_some(index)
  }

  // --- Player controls ---

  pub async fn toggle_pause(&mut self) {
    if self.player.can_pause()
      && let Err(e) = self.player.toggle_pause().await
    {
      self.set_error(format!("Pause error: {}", e));
    }
  }

  pub async fn stop_playback(&mut self) -> Result<()> {
    if self.player.is_playing() {
      self.player.stop().await?;
      self.gallery.deactivate();
    }
    Ok(())
  }

  pub async fn shutdown(&mut self) -> Result<()> {
    self.player.stop().await
  }
}
