//! Error taxonomy for the dashboard data layer.

use thiserror::Error;

/// Errors surfaced by the HTTP client, cache layer, and mutation coordinator.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Transport-level failure (connection refused, timeout, TLS, ...).
  #[error("network error: {0}")]
  Network(#[from] reqwest::Error),

  /// The server rejected the request with a non-auth error status.
  #[error("request failed ({status}): {message}")]
  Api { status: u16, message: String },

  /// The request was rejected as unauthenticated even after a retry.
  #[error("not authenticated")]
  Unauthorized,

  /// The refresh credential itself was rejected; the session is over.
  #[error("session expired")]
  SessionExpired,

  /// An optimistic projection could not be computed.
  #[error("projection failed: {0}")]
  Projection(String),

  #[error("serialization error: {0}")]
  Serde(#[from] serde_json::Error),

  #[error("invalid url: {0}")]
  Url(#[from] url::ParseError),

  #[error("credential store error: {0}")]
  Store(String),

  #[error("configuration error: {0}")]
  Config(String),
}
