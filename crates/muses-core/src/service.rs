//! Business operations for one entity type.
//!
//! `EntityService` composes validation, the uniqueness rule, the repository,
//! and (for linked entities) the external authority. The HTTP layer maps
//! requests one-to-one onto these methods.

use std::{collections::BTreeSet, time::Duration};

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
  authority::Authority,
  entity::{Entity, Search},
  error::{Error, Result},
  repository::Repository,
  store::{Document, DocumentStore},
  user::User,
};

pub struct EntityService<E, S, A> {
  repo:      Repository<E, S>,
  authority: Option<A>,
}

impl<E, S, A> EntityService<E, S, A>
where
  E: Entity,
  S: DocumentStore,
  A: Authority,
{
  /// `authority` is only consulted for entities with [`Entity::LINKED`].
  pub fn new(repo: Repository<E, S>, authority: Option<A>) -> Self {
    Self { repo, authority }
  }

  pub fn repository(&self) -> &Repository<E, S> { &self.repo }

  fn authority(&self) -> Option<&A> {
    if E::LINKED { self.authority.as_ref() } else { None }
  }

  /// Validate, check uniqueness, insert, then register with the authority.
  ///
  /// If registration fails the inserted document is deleted again, so a
  /// failed create leaves nothing behind.
  #[instrument(skip(self, entity), fields(kind = E::KIND))]
  pub async fn create(&self, actor: &str, mut entity: E) -> Result<E> {
    entity.validate(Utc::now())?;
    self.ensure_unique(&entity, None).await?;

    let created = self.repo.insert(&entity).await?;
    let Some(id) = created.id() else {
      return Ok(created);
    };

    if let Some(authority) = self.authority() {
      if let Err(source) = authority.link(actor, id).await {
        warn!(%id, error = %source, "link failed, rolling back insert");
        if let Err(rollback) = self.repo.delete_by_id(id).await {
          error!(
            %id,
            collection = self.repo.collection(),
            error = %rollback,
            "compensating delete failed, document is orphaned"
          );
        }
        return Err(Error::LinkFailed { kind: E::KIND, source });
      }
    }

    info!(%id, "created {}", E::KIND);
    Ok(created)
  }

  pub async fn list(&self) -> Result<Vec<E>> { self.repo.find_all().await }

  pub async fn search(&self, params: &E::Search) -> Result<Vec<E>> {
    self.repo.find_filtered(&params.to_filter()).await
  }

  pub async fn get(&self, id: Uuid) -> Result<E> { self.repo.find_by_id(id).await }

  /// Full-record update: the payload must satisfy every creation rule.
  #[instrument(skip(self, entity), fields(kind = E::KIND))]
  pub async fn update(&self, id: Uuid, mut entity: E) -> Result<E> {
    entity.validate(Utc::now())?;
    self.ensure_unique(&entity, Some(id)).await?;
    let updated = self.repo.update_by_id(id, &entity).await?;
    info!(%id, "updated {}", E::KIND);
    Ok(updated)
  }

  /// De-register `actor` first; the local document is only removed once the
  /// authority has agreed.
  #[instrument(skip(self), fields(kind = E::KIND))]
  pub async fn delete(&self, actor: &str, id: Uuid) -> Result<()> {
    if let Some(authority) = self.authority() {
      authority
        .unlink(actor)
        .await
        .map_err(|source| Error::UnlinkFailed { kind: E::KIND, source })?;
    }
    self.repo.delete_by_id(id).await?;
    info!(%id, "deleted {}", E::KIND);
    Ok(())
  }

  /// Whether the store answers within `within`.
  pub async fn ready(&self, within: Duration) -> Result<()> {
    self.repo.ping(within).await
  }

  /// Reject `entity` if another document already holds one of its unique
  /// keys. `exclude` is the record being updated, which may keep its own.
  async fn ensure_unique(&self, entity: &E, exclude: Option<Uuid>) -> Result<()> {
    let Some(filter) = entity.conflict_filter() else {
      return Ok(());
    };
    let clashes = self.repo.find_filtered(&filter).await?;
    if clashes.iter().any(|other| other.id() != exclude) {
      return Err(Error::Duplicate);
    }
    Ok(())
  }
}

// ─── User preferences ────────────────────────────────────────────────────────

impl<S, A> EntityService<User, S, A>
where
  S: DocumentStore,
  A: Authority,
{
  pub async fn preferences(&self, id: Uuid) -> Result<BTreeSet<String>> {
    Ok(self.repo.find_by_id(id).await?.preferences)
  }

  /// Replace the preference set. Duplicates collapse; an empty list clears
  /// it. No other field is touched.
  #[instrument(skip(self, tags))]
  pub async fn set_preferences(&self, id: Uuid, tags: Vec<String>) -> Result<User> {
    let tags: BTreeSet<String> = tags.into_iter().collect();
    let mut set = Document::new();
    set.insert(
      "preferences".into(),
      Value::Array(tags.into_iter().map(Value::String).collect()),
    );
    self.repo.set_fields(id, set).await
  }
}
