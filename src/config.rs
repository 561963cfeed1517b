use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Override for the credential file location (defaults to the platform
  /// data directory).
  pub credentials_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the REST API, e.g. "http://127.0.0.1:8000"
  pub base_url: String,
  /// Per-request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// How long cached data stays fresh, in seconds
  #[serde(default = "default_stale_secs")]
  pub stale_time_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_time_secs: default_stale_secs(),
    }
  }
}

fn default_timeout_secs() -> u64 {
  5
}

fn default_stale_secs() -> u64 {
  5 * 60
}

impl ApiConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./dashkit.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/dashkit/config.yaml
  /// 4. ~/.config/dashkit/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self, ApiError> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(ApiError::Config(format!(
          "config file not found: {}",
          p.display()
        )));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(ApiError::Config(
        "no configuration file found; create one at ~/.config/dashkit/config.yaml".to_string(),
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("dashkit.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("dashkit").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self, ApiError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
      ApiError::Config(format!("failed to read config file {}: {}", path.display(), e))
    })?;

    let config: Config = serde_yaml::from_str(&contents).map_err(|e| {
      ApiError::Config(format!(
        "failed to parse config file {}: {}",
        path.display(),
        e
      ))
    })?;

    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_minimal_config() {
    let yaml = "api:\n  base_url: http://127.0.0.1:8000\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.api.base_url, "http://127.0.0.1:8000");
    assert_eq!(config.api.timeout_secs, 5);
    assert_eq!(config.cache.stale_time_secs, 300);
    assert!(config.credentials_path.is_none());
  }

  #[test]
  fn test_parse_full_config() {
    let yaml = "api:\n  base_url: https://api.example.com\n  timeout_secs: 10\ncache:\n  stale_time_secs: 60\ncredentials_path: /tmp/creds.json\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.api.timeout_secs, 10);
    assert_eq!(config.cache.stale_time_secs, 60);
    assert_eq!(
      config.credentials_path,
      Some(PathBuf::from("/tmp/creds.json"))
    );
  }
}
