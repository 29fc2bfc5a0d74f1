//! The external authority that mirrors which actor created which entity.
//!
//! Users and museums register every created record with the authentication
//! service and de-register the actor before a local delete. The concrete
//! HTTP client lives in `muses-api`; this module only fixes the contract.

use std::{future::Future, sync::Arc};

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthorityError {
  /// The authority answered, but not with a 2xx.
  #[error("auth service responded with status {0}")]
  Status(u16),

  /// No usable answer: connection refused, timeout, malformed URL.
  #[error("auth service unreachable: {0}")]
  Transport(String),
}

pub trait Authority: Send + Sync {
  /// Record that `actor` owns the entity `entity_id`.
  fn link<'a>(
    &'a self,
    actor: &'a str,
    entity_id: Uuid,
  ) -> impl Future<Output = Result<(), AuthorityError>> + Send + 'a;

  /// Remove `actor`'s registration.
  fn unlink<'a>(
    &'a self,
    actor: &'a str,
  ) -> impl Future<Output = Result<(), AuthorityError>> + Send + 'a;
}

impl<A: Authority> Authority for Arc<A> {
  fn link<'a>(
    &'a self,
    actor: &'a str,
    entity_id: Uuid,
  ) -> impl Future<Output = Result<(), AuthorityError>> + Send + 'a {
    (**self).link(actor, entity_id)
  }

  fn unlink<'a>(
    &'a self,
    actor: &'a str,
  ) -> impl Future<Output = Result<(), AuthorityError>> + Send + 'a {
    (**self).unlink(actor)
  }
}
