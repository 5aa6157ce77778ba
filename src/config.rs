use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub retry: RetryConfig,
  #[serde(default)]
  pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the HR REST API
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Fixed per-request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl ApiConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
  /// Total attempts per fetch, including the first one
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
  /// Backoff before the first retry; doubles per attempt
  #[serde(default = "default_base_backoff_ms")]
  pub base_backoff_ms: u64,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_attempts: default_max_attempts(),
      base_backoff_ms: default_base_backoff_ms(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
  /// Polling interval for the general notification stream, in seconds
  #[serde(default = "default_refetch_interval_secs")]
  pub refetch_interval_secs: u64,
  /// How many records a notification surface shows at once
  #[serde(default = "default_visible_limit")]
  pub visible_limit: usize,
}

impl Default for NotificationConfig {
  fn default() -> Self {
    Self {
      refetch_interval_secs: default_refetch_interval_secs(),
      visible_limit: default_visible_limit(),
    }
  }
}

impl NotificationConfig {
  pub fn refetch_interval(&self) -> Duration {
    Duration::from_secs(self.refetch_interval_secs)
  }
}

fn default_base_url() -> String {
  "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
  10
}

fn default_max_attempts() -> u32 {
  3
}

fn default_base_backoff_ms() -> u64 {
  200
}

fn default_refetch_interval_secs() -> u64 {
  30
}

fn default_visible_limit() -> usize {
  5
}

impl Config {
  /// Load configuration from file, falling back to defaults when none exists.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./hrsync.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/hrsync/config.yaml
  ///
  /// The `HRSYNC_API_URL` environment variable overrides the base URL last.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(Error::Config(format!(
          "config file not found: {}",
          p.display()
        )));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    Ok(config.apply_env())
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("hrsync.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("hrsync").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
      Error::Config(format!(
        "failed to read config file {}: {}",
        path.display(),
        e
      ))
    })?;

    serde_yaml::from_str(&contents).map_err(|e| {
      Error::Config(format!(
        "failed to parse config file {}: {}",
        path.display(),
        e
      ))
    })
  }

  fn apply_env(mut self) -> Self {
    if let Ok(url) = std::env::var("HRSYNC_API_URL") {
      if !url.is_empty() {
        self.api.base_url = url;
      }
    }
    self
  }
}
