use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::constants;
use crate::error::ConfigError;

/// User preferences persisted in `prefs.toml`.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  /// Clear the search field after a successful submit (default: keep the text).
  pub clear_on_submit: Option<bool>,
}

impl Config {
  fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "reel")
  }

  pub fn load() -> Self {
    if let Some(proj_dirs) = Self::project_dirs() {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file) {
        return Self::parse(&content);
      }
    }
    Self::default()
  }

  /// Unknown or malformed preferences fall back to defaults.
  pub fn parse(content: &str) -> Self {
    match toml::from_str(content) {
      Ok(config) => config,
      Err(e) => {
        tracing::warn!(err = %e, "prefs.toml is malformed, using defaults");
        Self::default()
      }
    }
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = Self::project_dirs() {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }

  /// Directory for the rolling log file.
  pub fn log_dir() -> Option<PathBuf> {
    Self::project_dirs().map(|d| d.data_local_dir().join("logs"))
  }
}

/// Everything the TMDB client needs, resolved once at startup and handed to
/// the client explicitly.
#[derive(Debug, Clone)]
pub struct Settings {
  pub api_base_url: String,
  pub image_base_url: String,
  pub token: String,
  pub timeout: Duration,
}

impl Settings {
  /// Resolve settings from CLI/env values. A missing or blank token is a
  /// startup error, never a per-request one.
  pub fn resolve(token: Option<&str>, api_base_url: Option<&str>) -> Result<Self, ConfigError> {
    let token = token.map(str::trim).filter(|t| !t.is_empty()).ok_or(ConfigError::MissingToken)?;
    let api_base_url = api_base_url.unwrap_or(&constants().api_base_url);
    let image_base_url = constants().image_base_url.as_str();

    Ok(Self {
      api_base_url: validate_base_url(api_base_url)?,
      image_base_url: validate_base_url(image_base_url)?,
      token: token.to_string(),
      timeout: Duration::from_secs(constants().request_timeout_secs),
    })
  }
}

/// Parse `raw` as an absolute http(s) URL and strip any trailing slash so
/// endpoint paths can be appended directly.
fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
  let invalid = |reason: String| ConfigError::InvalidBaseUrl { url: raw.to_string(), reason };
  let url = reqwest::Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
  if !matches!(url.scheme(), "http" | "https") {
    return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
  }
  Ok(raw.trim_end_matches('/').to_string())
}
