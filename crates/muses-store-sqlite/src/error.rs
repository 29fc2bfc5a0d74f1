//! Error type for `muses-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A stored body that is valid JSON but not an object.
  #[error("corrupt document {0}: body is not an object")]
  Corrupt(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
