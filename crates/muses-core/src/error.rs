//! Error types for `muses-core`.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::{authority::AuthorityError, validate::ValidationError};

#[derive(Debug, Error)]
pub enum Error {
  /// The first rule the candidate entity violated.
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("email or username already taken")]
  Duplicate,

  #[error("{label} not found")]
  NotFound { label: &'static str, id: Uuid },

  /// Registration with the external authority failed; the local insert has
  /// already been rolled back (or the rollback was logged as failed).
  #[error("failed to link {kind} with auth service")]
  LinkFailed {
    kind:   &'static str,
    #[source]
    source: AuthorityError,
  },

  /// De-registration failed; the local document was left untouched.
  #[error("Could not delete {kind} from auth service")]
  UnlinkFailed {
    kind:   &'static str,
    #[source]
    source: AuthorityError,
  },

  #[error("{op} timed out after {after:?}")]
  Timeout { op: &'static str, after: Duration },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// `true` for failures caused by the caller rather than the service.
  pub fn is_client_error(&self) -> bool {
    matches!(
      self,
      Self::Validation(_)
        | Self::Duplicate
        | Self::NotFound { .. }
        | Self::LinkFailed { .. }
        | Self::UnlinkFailed { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
