//! JSON REST API for the MuSES resource services.
//!
//! Exposes one axum [`Router`] per resource, backed by an
//! [`EntityService`](muses_core::service::EntityService) over any
//! [`DocumentStore`]. Listening, TLS, and probes are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = muses_api::users_router(Arc::new(service));
//! ```

pub mod authority;
pub mod error;
pub mod handlers;
pub mod preferences;
pub mod query;

use axum::{Router, routing::get};
use muses_core::{
  artwork::Artwork,
  authority::Authority,
  entity::Entity,
  museum::Museum,
  store::DocumentStore,
  user::User,
};

pub use authority::HttpAuthority;
pub use error::ApiError;
pub use handlers::Shared;
use query::FromQuery;

/// Routes every resource shares, still awaiting their state.
fn crud_routes<E, S, A>() -> Router<Shared<E, S, A>>
where
  E: Entity,
  E::Search: FromQuery,
  S: DocumentStore + 'static,
  A: Authority + 'static,
{
  Router::new()
    .route(
      "/",
      get(handlers::list::<E, S, A>).post(handlers::create::<E, S, A>),
    )
    .route("/search", get(handlers::search::<E, S, A>))
    .route(
      "/{id}",
      get(handlers::get_one::<E, S, A>)
        .put(handlers::update::<E, S, A>)
        .delete(handlers::delete::<E, S, A>),
    )
}

/// `/`, `/search`, `/{id}` and `/{id}/preferences` for users.
pub fn users_router<S, A>(svc: Shared<User, S, A>) -> Router<()>
where
  S: DocumentStore + 'static,
  A: Authority + 'static,
{
  crud_routes::<User, S, A>()
    .route(
      "/{id}/preferences",
      get(preferences::get_preferences::<S, A>).patch(preferences::set_preferences::<S, A>),
    )
    .with_state(svc)
}

pub fn museums_router<S, A>(svc: Shared<Museum, S, A>) -> Router<()>
where
  S: DocumentStore + 'static,
  A: Authority + 'static,
{
  crud_routes::<Museum, S, A>().with_state(svc)
}

pub fn artworks_router<S, A>(svc: Shared<Artwork, S, A>) -> Router<()>
where
  S: DocumentStore + 'static,
  A: Authority + 'static,
{
  crud_routes::<Artwork, S, A>().with_state(svc)
}
