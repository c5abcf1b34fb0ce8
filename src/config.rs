use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// User preferences persisted to `prefs.toml` in the platform config dir.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  /// Manifest used when none is given on the command line.
  pub manifest: Option<String>,
  /// Player command used when `--player` is not given.
  pub player: Option<String>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "vgal") {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(&config_file) {
        match Self::parse(&content) {
          Some(config) => return config,
          None => warn!(path = %config_file.display(), "config: ignoring malformed prefs.toml"),
        }
      }
    }
    Self::default()
  }

  fn parse(content: &str) -> Option<Self> {
    toml::from_str(content).ok()
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "vgal") {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          match std::fs::write(&config_file, content) {
            Ok(()) => debug!(path = %config_file.display(), "config: saved"),
            Err(e) => warn!(err = %e, "config: failed to save prefs.toml"),
          }
        }
      }
    }
  }
}
