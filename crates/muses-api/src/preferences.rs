//! Handlers for `/{id}/preferences` (users only).
//!
//! | Method  | Path                | Notes |
//! |---------|---------------------|-------|
//! | `GET`   | `/{id}/preferences` | `{"preferences": [...]}` |
//! | `PATCH` | `/{id}/preferences` | Body: `{"preferences": [...]}`; returns the user |

use std::collections::BTreeSet;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
};
use muses_core::{authority::Authority, store::DocumentStore, user::User};
use serde::{Deserialize, Serialize};

use crate::{
  error::ApiError,
  handlers::{Shared, body, parse_id},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct Preferences<T> {
  pub preferences: T,
}

/// `GET /{id}/preferences`
pub async fn get_preferences<S, A>(
  State(svc): State<Shared<User, S, A>>,
  Path(id): Path<String>,
) -> Result<Json<Preferences<BTreeSet<String>>>, ApiError>
where
  S: DocumentStore,
  A: Authority,
{
  let id = parse_id::<User>(&id)?;
  let preferences = svc.preferences(id).await?;
  Ok(Json(Preferences { preferences }))
}

/// `PATCH /{id}/preferences`
pub async fn set_preferences<S, A>(
  State(svc): State<Shared<User, S, A>>,
  Path(id): Path<String>,
  payload: Result<Json<Preferences<Vec<String>>>, JsonRejection>,
) -> Result<Json<User>, ApiError>
where
  S: DocumentStore,
  A: Authority,
{
  let id = parse_id::<User>(&id)?;
  let Preferences { preferences } = body(payload)?;
  Ok(Json(svc.set_preferences(id, preferences).await?))
}
