//! Video manifest: record type, source resolution, fetching and parsing.
//!
//! A manifest is a JSON array of objects with optional `filename`, `url`, `sizeMB` and
//! `uploadedAt` fields. Records are read leniently: a field with the wrong JSON type is
//! treated as missing, so a malformed record degrades to placeholders instead of failing
//! the whole load. Only the top level is strict (it must be an array).

use anyhow::Context;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use reqwest::{Client, Url};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::constants::constants;

/// Naive date-time layouts accepted after RFC 3339. Interpreted in local time.
const NAIVE_DATETIME_FORMATS: [&str; 4] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

// --- Errors ---

/// Why a manifest load failed.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("request failed: {0}")]
  Network(#[from] reqwest::Error),
  #[error("server returned HTTP {0}")]
  Status(u16),
  #[error("failed to read {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("manifest is not valid JSON: {0}")]
  Json(#[from] serde_json::Error),
  #[error("manifest must be a JSON array, found {0}")]
  NotArray(&'static str),
}

// --- Video record ---

/// A single manifest entry. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Video {
  pub filename: Option<String>,
  pub url: Option<String>,
  pub size_mb: Option<f64>,
  pub uploaded_at: Option<String>,
}

impl Video {
  /// Build a record from one manifest array element. Non-object elements yield an empty record.
  pub fn from_value(value: &Value) -> Self {
    let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
    Self {
      filename: text("filename"),
      url: text("url"),
      size_mb: value.get("sizeMB").and_then(Value::as_f64),
      uploaded_at: text("uploadedAt"),
    }
  }

  /// Display name, falling back to the untitled placeholder for missing or empty names.
  pub fn title(&self) -> &str {
    self.filename.as_deref().filter(|s| !s.is_empty()).unwrap_or(constants().untitled_label.as_str())
  }

  /// The media locator, if the record can be played at all.
  pub fn playable_url(&self) -> Option<&str> {
    self.url.as_deref().filter(|s| !s.is_empty())
  }

  pub fn size_or_zero(&self) -> f64 {
    self.size_mb.unwrap_or(0.0)
  }

  /// Size formatted to two decimals, e.g. `12.50 MB`.
  pub fn size_label(&self) -> String {
    format_megabytes(self.size_or_zero())
  }

  /// Parsed upload time, or `None` when missing or unparsable.
  pub fn uploaded(&self) -> Option<DateTime<Utc>> {
    self.uploaded_at.as_deref().and_then(parse_timestamp)
  }

  /// Upload time rendered in local time, or `None` when missing or unparsable.
  pub fn uploaded_label(&self) -> Option<String> {
    self.uploaded().map(format_timestamp)
  }

  /// Whether the filename contains `needle`. `needle` must already be lowercase.
  pub fn matches(&self, needle: &str) -> bool {
    self.filename.as_deref().unwrap_or("").to_lowercase().contains(needle)
  }
}

pub fn format_megabytes(mb: f64) -> String {
  format!("{:.2} MB", mb)
}

/// Parse an upload timestamp.
///
/// Accepts RFC 3339 and minute-precision offsets, naive date-times (local time, or UTC with a
/// trailing `Z`), then `YYYY-MM-DD`, `YYYY-MM` and `YYYY` (UTC midnight of the first day).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  let raw = raw.trim();
  if raw.is_empty() {
    return None;
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.with_timezone(&Utc));
  }
  if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z") {
    return Some(dt.with_timezone(&Utc));
  }
  if let Some(utc) = raw.strip_suffix(['Z', 'z']) {
    return NAIVE_DATETIME_FORMATS.iter().find_map(|f| NaiveDateTime::parse_from_str(utc, f).ok()).map(|n| n.and_utc());
  }
  for format in NAIVE_DATETIME_FORMATS {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
      return Local.from_local_datetime(&naive).earliest().map(|dt| dt.with_timezone(&Utc));
    }
  }
  parse_date_only(raw).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|n| n.and_utc())
}

fn parse_date_only(raw: &str) -> Option<NaiveDate> {
  let digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
  match raw.split('-').collect::<Vec<_>>()[..] {
    [y, m, d] if digits(y, 4) && digits(m, 2) && digits(d, 2) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok(),
    [y, m] if digits(y, 4) && digits(m, 2) => NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, 1),
    [y] if digits(y, 4) => NaiveDate::from_ymd_opt(y.parse().ok()?, 1, 1),
    _ => None,
  }
}

pub fn format_timestamp(dt: DateTime<Utc>) -> String {
  dt.with_timezone(&Local).format(&constants().date_format).to_string()
}

// --- Source ---

/// Where the manifest lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
  Remote(Url),
  Local(PathBuf),
}

impl ManifestSource {
  /// `http://` and `https://` locations are fetched over the network; anything else is a file path.
  pub fn parse(location: &str) -> anyhow::Result<Self> {
    let location = location.trim();
    if location.starts_with("http://") || location.starts_with("https://") {
      let url = Url::parse(location).with_context(|| format!("Invalid manifest URL: {}", location))?;
      Ok(Self::Remote(url))
    } else {
      Ok(Self::Local(PathBuf::from(location)))
    }
  }
}

impl fmt::Display for ManifestSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Remote(url) => write!(f, "{}", url),
      Self::Local(path) => write!(f, "{}", path.display()),
    }
  }
}

/// Append the cache-defeating timestamp parameter to `url`.
pub fn cache_busted(url: &Url, epoch_millis: i64) -> Url {
  let mut busted = url.clone();
  busted.query_pairs_mut().append_pair(&constants().cache_bust_param, &epoch_millis.to_string());
  busted
}

// --- Fetch ---

pub fn http_client() -> anyhow::Result<Client> {
  Client::builder()
    .timeout(Duration::from_secs(constants().http_timeout_secs))
    .build()
    .context("Failed to build HTTP client")
}

/// Load and parse the manifest from `source`.
pub async fn fetch_manifest(client: &Client, source: &ManifestSource) -> Result<Vec<Video>, ManifestError> {
  let bytes = match source {
    ManifestSource::Remote(url) => {
      let url = cache_busted(url, Utc::now().timestamp_millis());
      debug!(url = %url, "manifest: fetching");
      let response = client.get(url).send().await?;
      let status = response.status();
      if !status.is_success() {
        return Err(ManifestError::Status(status.as_u16()));
      }
      response.bytes().await?.to_vec()
    }
    ManifestSource::Local(path) => {
      debug!(path = %path.display(), "manifest: reading");
      tokio::fs::read(path).await.map_err(|source| ManifestError::Io { path: path.clone(), source })?
    }
  };
  parse_manifest(&bytes)
}

/// Decode a manifest body. The top level must be a JSON array.
pub fn parse_manifest(bytes: &[u8]) -> Result<Vec<Video>, ManifestError> {
  match serde_json::from_slice::<Value>(bytes)? {
    Value::Array(items) => Ok(items.iter().map(Video::from_value).collect()),
    other => Err(ManifestError::NotArray(json_kind(&other))),
  }
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}
