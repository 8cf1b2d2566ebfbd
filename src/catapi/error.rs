use thiserror::Error;

/// Failure modes of a cat image search
#[derive(Debug, Error)]
pub enum CatApiError {
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("unexpected HTTP status {0}")]
  Status(reqwest::StatusCode),

  #[error("malformed response body: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("invalid cat record at index {index}: {reason}")]
  Schema { index: usize, reason: String },
}
