use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Page title shown in the header
  #[serde(default = "default_title")]
  pub title: String,
  #[serde(default)]
  pub cat_api: CatApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub registration: RegistrationConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      title: default_title(),
      cat_api: CatApiConfig::default(),
      cache: CacheConfig::default(),
      registration: RegistrationConfig::default(),
    }
  }
}

fn default_title() -> String {
  "Cat Registry".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatApiConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Images per search
  #[serde(default = "default_limit")]
  pub limit: u32,
  /// Never read from the file, see [`Config::get_api_key`]
  #[serde(skip)]
  pub api_key: Option<String>,
}

impl Default for CatApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      limit: default_limit(),
      api_key: None,
    }
  }
}

fn default_base_url() -> String {
  "https://api.thecatapi.com/v1".to_string()
}

fn default_limit() -> u32 {
  10
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Seconds before a cached query is refetched on next observation
  #[serde(default = "default_stale_time_secs")]
  pub stale_time_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_time_secs: default_stale_time_secs(),
    }
  }
}

impl CacheConfig {
  pub fn stale_time(&self) -> chrono::Duration {
    // chrono panics past i64::MAX milliseconds
    let secs = i64::try_from(self.stale_time_secs)
      .unwrap_or(i64::MAX)
      .min(i64::MAX / 1000);
    chrono::Duration::seconds(secs)
  }
}

fn default_stale_time_secs() -> u64 {
  120
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
  /// Simulated submission latency
  #[serde(default = "default_delay_ms")]
  pub delay_ms: u64,
}

impl Default for RegistrationConfig {
  fn default() -> Self {
    Self {
      delay_ms: default_delay_ms(),
    }
  }
}

impl RegistrationConfig {
  pub fn delay(&self) -> Duration {
    Duration::from_millis(self.delay_ms)
  }
}

fn default_delay_ms() -> u64 {
  500
}

impl Config {
  /// Load configuration from file, then pick up the API key.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./catui.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/catui/config.yaml
  ///
  /// Without any file the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };
    config.cat_api.api_key = Self::get_api_key();

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("catui.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("catui").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file deserializes to null, treat it as "all defaults"
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Get The Cat API key from environment variables.
  ///
  /// Checks CATUI_API_KEY first, then CAT_API_KEY as fallback. A missing key
  /// is not an error: requests are then sent unauthenticated.
  pub fn get_api_key() -> Option<String> {
    api_key_from(|name| std::env::var(name).ok())
  }
}

fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
  ["CATUI_API_KEY", "CAT_API_KEY"]
    .into_iter()
    .filter_map(lookup)
    .find(|key| !key.trim().is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.title, "Cat Registry");
    assert_eq!(config.cat_api.base_url, "https://api.thecatapi.com/v1");
    assert_eq!(config.cat_api.limit, 10);
    assert_eq!(config.cache.stale_time(), chrono::Duration::minutes(2));
    assert_eq!(config.registration.delay(), Duration::from_millis(500));
  }

  #[test]
  fn test_parse_partial_file() {
    let config = Config::parse("cat_api:\n  limit: 4\nregistration:\n  delay_ms: 0\n").unwrap();
    assert_eq!(config.cat_api.limit, 4);
    assert_eq!(config.cat_api.base_url, "https://api.thecatapi.com/v1");
    assert_eq!(config.registration.delay_ms, 0);
    assert_eq!(config.cache.stale_time_secs, 120);
    assert_eq!(config.title, "Cat Registry");
  }

  #[test]
  fn test_huge_stale_time_is_clamped() {
    for secs in [u64::MAX, i64::MAX as u64, i64::MAX as u64 / 1000 + 1] {
      let cache = CacheConfig {
        stale_time_secs: secs,
      };
      assert_eq!(cache.stale_time(), chrono::Duration::seconds(i64::MAX / 1000));
    }
  }

  #[test]
  fn test_parse_empty_file() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.cat_api.limit, 10);
  }

  #[test]
  fn test_api_key_is_not_read_from_file() {
    let config = Config::parse("cat_api:\n  api_key: leaked\n").unwrap();
    assert_eq!(config.cat_api.api_key, None);
  }

  #[test]
  fn test_parse_invalid_file() {
    assert!(Config::parse("cache:\n  stale_time_secs: soon\n").is_err());
  }

  #[test]
  fn test_missing_explicit_path() {
    let err = Config::load(Some(Path::new("/nonexistent/catui.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }

  #[test]
  fn test_api_key_lookup_order() {
    let key = api_key_from(|name| match name {
      "CATUI_API_KEY" => Some("primary".to_string()),
      "CAT_API_KEY" => Some("fallback".to_string()),
      _ => None,
    });
    assert_eq!(key.as_deref(), Some("primary"));

    let key = api_key_from(|name| (name == "CAT_API_KEY").then(|| "fallback".to_string()));
    assert_eq!(key.as_deref(), Some("fallback"));

    assert_eq!(api_key_from(|_| None), None);
    assert_eq!(api_key_from(|_| Some("  ".to_string())), None);
  }
}
