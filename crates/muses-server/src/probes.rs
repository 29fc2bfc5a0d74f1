//! Liveness and readiness probes.

use std::time::Duration;

use axum::{
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use muses_api::Shared;
use muses_core::{authority::Authority, entity::Entity, store::DocumentStore};
use tracing::warn;

/// How long `/ready` waits for the store.
pub const READY_TIMEOUT: Duration = Duration::from_secs(2);

/// `GET /health`: the process is up. Touches nothing.
pub async fn health<E: Entity>() -> String {
  format!("{} system is online\n", E::LABEL)
}

/// `GET /ready`: the store answers a ping in time.
pub async fn ready<E, S, A>(State(svc): State<Shared<E, S, A>>) -> Response
where
  E: Entity,
  S: DocumentStore,
  A: Authority,
{
  match svc.ready(READY_TIMEOUT).await {
    Ok(()) => format!("{} system is ready\n", E::LABEL).into_response(),
    Err(e) => {
      warn!(error = %e, "readiness check failed");
      (StatusCode::SERVICE_UNAVAILABLE, "unready: cannot reach store\n").into_response()
    }
  }
}
