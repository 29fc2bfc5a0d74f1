//! Startup errors for the server.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("store error: {0}")]
  Store(#[from] muses_store_sqlite::Error),

  #[error("auth service client: {0}")]
  Authority(#[from] muses_core::authority::AuthorityError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
