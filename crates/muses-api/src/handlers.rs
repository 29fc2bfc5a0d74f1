//! Generic CRUD handlers, instantiated once per entity type.
//!
//! | Method   | Path      | Notes |
//! |----------|-----------|-------|
//! | `POST`   | `/`       | 201 + created entity |
//! | `GET`    | `/`       | every entity, insertion order |
//! | `GET`    | `/search` | entity-specific query parameters |
//! | `GET`    | `/{id}`   | 404 if not found |
//! | `PUT`    | `/{id}`   | full-record update |
//! | `DELETE` | `/{id}`   | `{"message": "<Label> deleted successfully"}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, RawQuery, State, rejection::JsonRejection},
  http::{HeaderMap, StatusCode},
};
use muses_core::{
  authority::Authority,
  entity::Entity,
  service::EntityService,
  store::DocumentStore,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  error::ApiError,
  query::{FromQuery, QueryPairs},
};

/// Header carrying the identifier of the calling user.
pub const ACTOR_HEADER: &str = "userid";

pub type Shared<E, S, A> = Arc<EntityService<E, S, A>>;

/// The caller's identity as sent, or `""` when absent.
pub(crate) fn actor(headers: &HeaderMap) -> &str {
  headers
    .get(ACTOR_HEADER)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default()
}

pub(crate) fn parse_id<E: Entity>(raw: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw.trim())
    .map_err(|_| ApiError::BadRequest(format!("Invalid {} ID format", E::KIND)))
}

pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
  payload
    .map(|Json(value)| value)
    .map_err(|_| ApiError::BadRequest("Invalid JSON format".into()))
}

/// `POST /`
pub async fn create<E, S, A>(
  State(svc): State<Shared<E, S, A>>,
  headers: HeaderMap,
  payload: Result<Json<E>, JsonRejection>,
) -> Result<(StatusCode, Json<E>), ApiError>
where
  E: Entity,
  S: DocumentStore,
  A: Authority,
{
  let entity = body(payload)?;
  let created = svc.create(actor(&headers), entity).await?;
  Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /`
pub async fn list<E, S, A>(
  State(svc): State<Shared<E, S, A>>,
) -> Result<Json<Vec<E>>, ApiError>
where
  E: Entity,
  S: DocumentStore,
  A: Authority,
{
  Ok(Json(svc.list().await?))
}

/// `GET /search[?...]`
pub async fn search<E, S, A>(
  State(svc): State<Shared<E, S, A>>,
  RawQuery(raw): RawQuery,
) -> Result<Json<Vec<E>>, ApiError>
where
  E: Entity,
  E::Search: FromQuery,
  S: DocumentStore,
  A: Authority,
{
  let params = <E::Search as FromQuery>::from_query(&QueryPairs::parse(raw.as_deref()))?;
  Ok(Json(svc.search(&params).await?))
}

/// `GET /{id}`
pub async fn get_one<E, S, A>(
  State(svc): State<Shared<E, S, A>>,
  Path(id): Path<String>,
) -> Result<Json<E>, ApiError>
where
  E: Entity,
  S: DocumentStore,
  A: Authority,
{
  let id = parse_id::<E>(&id)?;
  Ok(Json(svc.get(id).await?))
}

/// `PUT /{id}`
pub async fn update<E, S, A>(
  State(svc): State<Shared<E, S, A>>,
  Path(id): Path<String>,
  payload: Result<Json<E>, JsonRejection>,
) -> Result<Json<E>, ApiError>
where
  E: Entity,
  S: DocumentStore,
  A: Authority,
{
  let id = parse_id::<E>(&id)?;
  let entity = body(payload)?;
  Ok(Json(svc.update(id, entity).await?))
}

/// `DELETE /{id}`
///
/// The identifier is checked before the authentication service is told
/// anything.
pub async fn delete<E, S, A>(
  State(svc): State<Shared<E, S, A>>,
  Path(id): Path<String>,
  headers: HeaderMap,
) -> Result<Json<Value>, ApiError>
where
  E: Entity,
  S: DocumentStore,
  A: Authority,
{
  let id = parse_id::<E>(&id)?;
  svc.delete(actor(&headers), id).await?;
  Ok(Json(json!({ "message": format!("{} deleted successfully", E::LABEL) })))
}
