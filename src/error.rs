//! Domain error types.
//!
//! Search failures collapse into a single [`FetchError`]; the orchestrator
//! treats every failure the same way, so there is nothing to gain from
//! distinguishing network, status and decode errors at this layer. The
//! underlying cause is kept as the error source for logging.

use thiserror::Error;

/// Any failure of a single search request: transport, non-2xx status or a
/// body that isn't the expected JSON envelope.
#[derive(Debug, Error)]
#[error("movie search failed: {reason}")]
pub struct FetchError {
  reason: String,
  #[source]
  source: Option<reqwest::Error>,
}

impl FetchError {
  pub fn new(reason: impl Into<String>) -> Self {
    Self { reason: reason.into(), source: None }
  }

  pub fn reason(&self) -> &str {
    &self.reason
  }
}

impl From<reqwest::Error> for FetchError {
  fn from(err: reqwest::Error) -> Self {
    let reason = if err.is_timeout() {
      "request timed out".to_string()
    } else if err.is_decode() {
      "malformed response body".to_string()
    } else if let Some(status) = err.status() {
      format!("HTTP {}", status)
    } else {
      "network error".to_string()
    };
    Self { reason, source: Some(err) }
  }
}

/// Startup configuration problems. These are fatal: the terminal is never
/// initialised when one of them occurs.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// No bearer token in `--token` / `TMDB_TOKEN`.
  #[error("missing TMDB API token: set TMDB_TOKEN or pass --token")]
  MissingToken,

  /// The API or image base URL could not be parsed.
  #[error("invalid base URL {url:?}: {reason}")]
  InvalidBaseUrl { url: String, reason: String },

  /// The token contains bytes that aren't valid in an HTTP header.
  #[error("TMDB API token is not a valid header value")]
  InvalidToken,

  #[error("failed to build HTTP client: {0}")]
  HttpClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::error::Error as _;

  #[test]
  fn fetch_error_message_includes_reason() {
    let err = FetchError::new("HTTP 401 Unauthorized");
    assert_eq!(err.reason(), "HTTP 401 Unauthorized");
    assert_eq!(err.to_string(), "movie search failed: HTTP 401 Unauthorized");
    assert!(err.source().is_none());
  }

  #[test]
  fn config_error_messages() {
    assert!(ConfigError::MissingToken.to_string().contains("TMDB_TOKEN"));
    let err = ConfigError::InvalidBaseUrl { url: "nope".into(), reason: "relative URL without a base".into() };
    assert!(err.to_string().contains("\"nope\""));
  }
}
