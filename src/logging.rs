//! File logging. The terminal belongs to the UI, so tracing output goes to a daily
//! rolling file under the platform cache dir (`RUST_LOG` or `--log-level` selects the filter).

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "vgal=info";

/// Directory the log files are written to.
pub fn log_dir() -> PathBuf {
  ProjectDirs::from("", "", "vgal")
    .map(|dirs| dirs.cache_dir().join("logs"))
    .unwrap_or_else(|| std::env::temp_dir().join("vgal-logs"))
}

/// Pick the filter directive: explicit override, then `RUST_LOG`, then the default.
fn filter_directive(level: Option<&str>) -> String {
  level
    .map(str::to_string)
    .or_else(|| std::env::var(EnvFilter::DEFAULT_ENV).ok().filter(|s| !s.trim().is_empty()))
    .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global subscriber. Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init(level: Option<&str>) -> Result<WorkerGuard> {
  let dir = log_dir();
  std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;

  let appender = tracing_appender::rolling::daily(&dir, "vgal.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_new(filter_directive(level)).context("Invalid log filter")?;
  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(false))
    .try_init()
    .context("Failed to install tracing subscriber")?;

  Ok(guard)
}
