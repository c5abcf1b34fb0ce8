//! Gallery state: the loaded video list, the filtered view, and the active selection.
//!
//! Nothing here touches the terminal or the player process. Operations that change what
//! should be playing return a [`PlayerCommand`] for the caller to carry out, and
//! [`Gallery::cards`] produces plain view models for the list renderer.

use tracing::{debug, info};

use crate::constants::constants;
use crate::manifest::{Video, format_megabytes};

/// What the player surface should do after a gallery operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
  /// Point the player at `url`, reload it and try to start playback.
  Play { url: String },
  /// Detach the current source and stop playback.
  Clear,
}

/// Text shown in the now-playing panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NowPlaying {
  pub title: String,
  pub size: String,
  pub date: String,
}

/// One rendered list card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
  pub title: String,
  pub size: String,
  pub date: String,
  pub active: bool,
}

/// Aggregate figures over the whole loaded list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
  pub count: usize,
  pub total_mb: f64,
}

impl Stats {
  pub fn count_label(&self) -> String {
    if self.count == 1 { "1 video".to_string() } else { format!("{} videos", self.count) }
  }

  pub fn size_label(&self) -> String {
    format_megabytes(self.total_mb)
  }
}

#[derive(Debug, Default)]
pub struct Gallery {
  /// Every loaded video, newest first.
  all: Vec<Video>,
  /// Indices into `all` that match `query`, in `all` order.
  filtered: Vec<usize>,
  /// Index into `filtered` of the playing video.
  active: Option<usize>,
  /// Normalised (trimmed, lowercase) search query.
  query: String,
  now_playing: NowPlaying,
}

impl Gallery {
  pub fn new() -> Self {
    Self::default()
  }

  /// Replace the whole list with a freshly loaded manifest.
  ///
  /// Videos are sorted newest first; undated or unparsable entries sort after every dated
  /// one and keep their manifest order. The filter is reset, and the first video is
  /// activated when the list is non-empty.
  pub fn load(&mut self, videos: Vec<Video>) -> Option<PlayerCommand> {
    // Decorate once so each timestamp is parsed a single time.
    let mut keyed: Vec<_> = videos.into_iter().map(|v| (v.uploaded(), v)).collect();
    keyed.sort_by(|(a, _), (b, _)| b.cmp(a));
    self.all = keyed.into_iter().map(|(_, v)| v).collect();
    self.query.clear();
    self.filtered = (0..self.all.len()).collect();
    self.active = None;

    let stats = self.stats();
    info!(count = stats.count, total_mb = stats.total_mb, "gallery: manifest loaded");

    if self.filtered.is_empty() { None } else { self.activate(0) }
  }

  /// Record a failed load. Only the now-playing title changes.
  pub fn load_failed(&mut self) {
    self.now_playing.title = constants().load_error_title.clone();
  }

  /// Make the video at `index` in the filtered view the active one.
  ///
  /// Does nothing when `index` is out of range or the video has no playable URL.
  pub fn activate(&mut self, index: usize) -> Option<PlayerCommand> {
    let video = self.filtered.get(index).map(|&i| &self.all[i])?;
    let url = video.playable_url()?.to_string();

    self.now_playing = NowPlaying {
      title: video.title().to_string(),
      size: video.size_label(),
      date: video.uploaded_label().map(|d| format!("{}{}", constants().uploaded_prefix, d)).unwrap_or_default(),
    };
    self.active = Some(index);
    debug!(index, url = %url, "gallery: activated");
    Some(PlayerCommand::Play { url })
  }

  /// Re-filter by a case-insensitive filename substring and select the first match.
  ///
  /// The active selection is always reset. With no matches the player is cleared and the
  /// now-playing panel shows the no-match placeholder. When the first match has no URL
  /// nothing is activated and the player is left alone.
  pub fn search(&mut self, query: &str) -> Option<PlayerCommand> {
    self.query = query.trim().to_lowercase();
    self.filtered = if self.query.is_empty() {
      (0..self.all.len()).collect()
    } else {
      self.all.iter().enumerate().filter(|(_, v)| v.matches(&self.query)).map(|(i, _)| i).collect()
    };
    self.active = None;
    debug!(query = %self.query, matches = self.filtered.len(), "gallery: search");

    if self.filtered.is_empty() {
      self.now_playing =
        NowPlaying { title: constants().no_match_title.clone(), size: String::new(), date: String::new() };
      return Some(PlayerCommand::Clear);
    }
    self.activate(0)
  }

  /// Forget the active selection after playback was stopped externally.
  pub fn deactivate(&mut self) {
    self.active = None;
    self.now_playing = NowPlaying::default();
  }

  pub fn stats(&self) -> Stats {
    Stats { count: self.all.len(), total_mb: self.all.iter().map(Video::size_or_zero).sum() }
  }

  /// One card per video in the filtered view. Empty when nothing matches.
  pub fn cards(&self) -> Vec<CardView> {
    self
      .filtered
      .iter()
      .enumerate()
      .map(|(pos, &i)| {
        let video = &self.all[i];
        CardView {
          title: video.title().to_string(),
          size: video.size_label(),
          date: video.uploaded_label().unwrap_or_else(|| constants().unknown_date_label.clone()),
          active: self.active == Some(pos),
        }
      })
      .collect()
  }

  pub fn active(&self) -> Option<usize> {
    self.active
  }

  pub fn now_playing(&self) -> &NowPlaying {
    &self.now_playing
  }

  pub fn visible_len(&self) -> usize {
    self.filtered.len()
  }

  pub fn is_empty(&self) -> bool {
    self.all.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn video(name: &str, uploaded_at: Option<&str>) -> Video {
    Video {
      filename: Some(name.to_string()),
      url: Some(format!("https://cdn.example.com/{}", name)),
      size_mb: None,
      uploaded_at: uploaded_at.map(str::to_string),
    }
  }

  fn names(gallery: &Gallery) -> Vec<&str> {
    gallery.filtered.iter().map(|&i| gallery.all[i].title()).collect()
  }

  fn play(name: &str) -> Option<PlayerCommand> {
    Some(PlayerCommand::Play { url: format!("https://cdn.example.com/{}", name) })
  }

  // --- load ---

  #[test]
  fn load_sorts_newest_first_and_activates_first() {
    let mut g = Gallery::new();
    let cmd = g.load(vec![video("a", Some("2024-01-01")), video("b", Some("2024-01-02"))]);
    assert_eq!(names(&g), ["b", "a"]);
    assert_eq!(cmd, play("b"));
    assert_eq!(g.active(), Some(0));
    assert_eq!(g.now_playing().title, "b");
  }

  #[test]
  fn load_keeps_already_sorted_order() {
    let mut g = Gallery::new();
    g.load(vec![video("b", Some("2024-01-02")), video("a", Some("2024-01-01"))]);
    assert_eq!(names(&g), ["b", "a"]);
  }

  #[test]
  fn load_puts_undated_and_unparsable_last_in_manifest_order() {
    let mut g = Gallery::new();
    g.load(vec![
      video("missing", None),
      video("old", Some("2020-05-01T08:00:00Z")),
      video("garbage", Some("not a date")),
      video("new", Some("2023-05-01T08:00:00Z")),
    ]);
    assert_eq!(names(&g), ["new", "old", "missing", "garbage"]);
  }

  #[test]
  fn load_equal_dates_are_stable() {
    let mut g = Gallery::new();
    g.load(vec![video("first", Some("2024-01-01")), video("second", Some("2024-01-01"))]);
    assert_eq!(names(&g), ["first", "second"]);
  }

  #[test]
  fn load_empty_manifest_activates_nothing() {
    let mut g = Gallery::new();
    assert_eq!(g.load(Vec::new()), None);
    assert!(g.is_empty());
    assert!(g.cards().is_empty());
    assert_eq!(g.active(), None);
  }

  #[test]
  fn load_replaces_previous_list_and_clears_query() {
    let mut g = Gallery::new();
    g.load(vec![video("Apple.mp4", None), video("grape.mp4", None)]);
    g.search("grape");
    g.load(vec![video("kiwi.mp4", None)]);
    assert_eq!(names(&g), ["kiwi.mp4"]);
    assert_eq!(g.stats().count, 1);
  }

  #[test]
  fn load_first_without_url_leaves_nothing_active() {
    let mut g = Gallery::new();
    let mut first = video("no-url", Some("2024-02-01"));
    first.url = None;
    let cmd = g.load(vec![first, video("second", Some("2024-01-01"))]);
    assert_eq!(cmd, None);
    assert_eq!(g.active(), None);
  }

  #[test]
  fn load_failed_sets_error_title_only() {
    let mut g = Gallery::new();
    g.load_failed();
    assert_eq!(g.now_playing().title, constants().load_error_title);
    assert!(g.is_empty());
    assert!(g.cards().is_empty());

    g.load(vec![video("kept", None)]);
    g.load_failed();
    assert_eq!(names(&g), ["kept"]);
  }

  // --- stats ---

  #[test]
  fn stats_sum_sizes_treating_missing_as_zero() {
    let mut g = Gallery::new();
    let sizes = [Some(10.0), None, Some(5.5)];
    g.load(sizes.iter().map(|&s| Video { size_mb: s, ..video("v", None) }).collect());
    let stats = g.stats();
    assert_eq!(stats.count, 3);
    assert_eq!(stats.size_label(), "15.50 MB");
    assert_eq!(stats.count_label(), "3 videos");
  }

  #[test]
  fn stats_singular_label() {
    let stats = Stats { count: 1, total_mb: 0.0 };
    assert_eq!(stats.count_label(), "1 video");
    assert_eq!(stats.size_label(), "0.00 MB");
  }

  // --- activate ---

  #[test]
  fn activate_updates_now_playing() {
    let mut g = Gallery::new();
    let v = Video { size_mb: Some(2.0), ..video("clip.mp4", Some("2024-01-02")) };
    g.load(vec![v]);
    let np = g.now_playing();
    assert_eq!(np.title, "clip.mp4");
    assert_eq!(np.size, "2.00 MB");
    assert!(np.date.starts_with(&constants().uploaded_prefix));
  }

  #[test]
  fn activate_out_of_range_is_noop() {
    let mut g = Gallery::new();
    g.load(vec![video("a", None)]);
    assert_eq!(g.activate(5), None);
    assert_eq!(g.active(), Some(0));
  }

  #[test]
  fn activate_without_url_keeps_current_video() {
    let mut g = Gallery::new();
    let mut broken = video("broken", Some("2024-01-01"));
    broken.url = None;
    g.load(vec![video("good", Some("2024-01-02")), broken]);
    assert_eq!(g.active(), Some(0));

    assert_eq!(g.activate(1), None);
    assert_eq!(g.active(), Some(0));
    assert_eq!(g.now_playing().title, "good");
    assert_eq!(g.cards().len(), 2);
    assert_eq!(g.cards()[1].title, "broken");
  }

  #[test]
  fn activate_moves_active_card() {
    let mut g = Gallery::new();
    g.load(vec![video("a", Some("2024-01-02")), video("b", Some("2024-01-01"))]);
    assert_eq!(g.activate(1), play("b"));
    let active: Vec<bool> = g.cards().iter().map(|c| c.active).collect();
    assert_eq!(active, [false, true]);
    assert_eq!(g.now_playing().title, "b");
  }

  #[test]
  fn activate_undated_video_blanks_date_line() {
    let mut g = Gallery::new();
    g.load(vec![video("a", None)]);
    assert_eq!(g.now_playing().date, "");
  }

  // --- search ---

  fn fruit() -> Gallery {
    let mut g = Gallery::new();
    g.load(vec![
      video("Apple.mp4", Some("2024-01-03")),
      video("banana.mp4", Some("2024-01-02")),
      video("grape.mp4", Some("2024-01-01")),
    ]);
    g
  }

  #[test]
  fn search_is_case_insensitive_substring() {
    let mut g = fruit();
    assert_eq!(g.search("a"), play("Apple.mp4"));
    assert_eq!(names(&g), ["Apple.mp4", "banana.mp4", "grape.mp4"]);

    assert_eq!(g.search("APP"), play("Apple.mp4"));
    assert_eq!(names(&g), ["Apple.mp4"]);

    assert_eq!(g.search("an"), play("banana.mp4"));
    assert_eq!(names(&g), ["banana.mp4"]);
  }

  #[test]
  fn search_no_match_clears_player() {
    let mut g = fruit();
    assert_eq!(g.search("xyz"), Some(PlayerCommand::Clear));
    assert!(g.cards().is_empty());
    assert_eq!(g.active(), None);
    assert_eq!(g.now_playing().title, constants().no_match_title);
    assert!(g.now_playing().size.is_empty());
    assert!(g.now_playing().date.is_empty());
  }

  #[test]
  fn search_empty_or_blank_query_restores_full_list() {
    let mut g = fruit();
    g.search("grape");
    assert_eq!(g.search("   "), play("Apple.mp4"));
    assert_eq!(g.visible_len(), 3);
    g.search("grape");
    g.search("");
    assert_eq!(g.visible_len(), 3);
  }

  #[test]
  fn search_resets_active_to_first_match() {
    let mut g = fruit();
    g.activate(2);
    g.search("mp4");
    assert_eq!(g.active(), Some(0));
  }

  #[test]
  fn search_first_match_without_url_leaves_none_active() {
    let mut g = Gallery::new();
    let mut broken = video("broken.mp4", Some("2024-01-02"));
    broken.url = None;
    g.load(vec![broken, video("fine.mp4", Some("2024-01-01"))]);
    assert_eq!(g.search("mp4"), None);
    assert_eq!(g.active(), None);
    assert!(g.cards().iter().all(|c| !c.active));
  }

  #[test]
  fn search_over_empty_list_clears() {
    let mut g = Gallery::new();
    assert_eq!(g.search("anything"), Some(PlayerCommand::Clear));
    assert_eq!(g.search(""), Some(PlayerCommand::Clear));
  }

  #[test]
  fn search_matches_untitled_only_on_empty_query() {
    let mut g = Gallery::new();
    g.load(vec![Video { filename: None, ..video("x", None) }]);
    assert_eq!(g.search("untitled"), Some(PlayerCommand::Clear));
  }

  // --- cards ---

  #[test]
  fn cards_use_placeholders() {
    let mut g = Gallery::new();
    g.load(vec![Video { url: Some("u".into()), ..Video::default() }]);
    let cards = g.cards();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].title, constants().untitled_label);
    assert_eq!(cards[0].size, "0.00 MB");
    assert_eq!(cards[0].date, constants().unknown_date_label);
    assert!(cards[0].active);
  }

  #[test]
  fn deactivate_clears_selection() {
    let mut g = fruit();
    g.deactivate();
    assert_eq!(g.active(), None);
    assert_eq!(g.now_playing(), &NowPlaying::default());
    assert!(g.cards().iter().all(|c| !c.active));
  }
}
