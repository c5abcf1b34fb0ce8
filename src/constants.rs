//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!`, so there is no runtime file I/O.
//! Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Manifest
  pub default_manifest: String,
  pub cache_bust_param: String,
  pub http_timeout_secs: u64,

  // Player
  pub player_command: String,

  // Labels
  pub untitled_label: String,
  pub unknown_date_label: String,
  pub uploaded_prefix: String,
  pub load_error_title: String,
  pub no_match_title: String,
  pub empty_state: String,

  pub date_format: String,

  // Event loop
  pub poll_interval_ms: u64,
  pub error_dismiss_secs: u64,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed the first access panics in every test run.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
