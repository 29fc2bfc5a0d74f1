//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// An error returned by an API handler.
///
/// The display text of every variant except [`ApiError::Internal`] is sent to
/// the client verbatim as `{"error": "<text>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  /// Detail is logged, never returned.
  #[error("internal error: {0}")]
  Internal(String),
}

impl From<muses_core::Error> for ApiError {
  fn from(err: muses_core::Error) -> Self {
    use muses_core::Error as E;
    match err {
      E::Validation(rule) => Self::BadRequest(rule.to_string()),
      E::Duplicate => Self::Conflict(err.to_string()),
      E::NotFound { .. } => Self::NotFound(err.to_string()),
      E::LinkFailed { ref source, .. } | E::UnlinkFailed { ref source, .. } => {
        warn!(error = %source, "auth service call failed");
        Self::BadRequest(err.to_string())
      }
      E::Timeout { .. } | E::Serialization(_) | E::Store(_) => {
        Self::Internal(err.to_string())
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
      ApiError::Internal(detail) => {
        error!(%detail, "request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "Internal server error".to_owned(),
        )
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
