//! Generic typed persistence over one collection of a [`DocumentStore`].
//!
//! The repository owns the store-managed fields ([`Meta`]): it discards
//! whatever the caller put there, stamps `created_at`/`updated_at`, and
//! translates "zero documents affected" into [`Error::NotFound`]. Every store
//! call is bounded by a timeout.

use std::{future::Future, marker::PhantomData, sync::Arc, time::Duration};

use chrono::Utc;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::{
  entity::{Entity, Meta},
  error::{Error, Result},
  filter::Filter,
  store::{Document, DocumentStore},
};

/// Upper bounds for store calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
  /// Reads and writes addressing a single document.
  pub single: Duration,
  /// Collection scans (`find_all`, `find_filtered`).
  pub scan:   Duration,
}

impl Default for Timeouts {
  fn default() -> Self {
    Self {
      single: Duration::from_secs(5),
      scan:   Duration::from_secs(10),
    }
  }
}

pub struct Repository<E, S> {
  store:      Arc<S>,
  collection: String,
  timeouts:   Timeouts,
  _entity:    PhantomData<fn() -> E>,
}

impl<E, S> Clone for Repository<E, S> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      collection: self.collection.clone(),
      timeouts:   self.timeouts,
      _entity:    PhantomData,
    }
  }
}

impl<E: Entity, S: DocumentStore> Repository<E, S> {
  pub fn new(store: Arc<S>, collection: impl Into<String>) -> Self {
    Self {
      store,
      collection: collection.into(),
      timeouts: Timeouts::default(),
      _entity: PhantomData,
    }
  }

  pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
    self.timeouts = timeouts;
    self
  }

  pub fn collection(&self) -> &str { &self.collection }

  /// Persist a new document and return the entity as stored, with its
  /// generated identifier and both timestamps set to the same instant.
  pub async fn insert(&self, entity: &E) -> Result<E> {
    let now = Utc::now();
    let mut doc = to_document(entity)?;
    let stamp = serde_json::to_value(now)?;
    doc.insert("created_at".into(), stamp.clone());
    doc.insert("updated_at".into(), stamp);

    let id = bounded(
      "insert",
      self.timeouts.single,
      self.store.insert(&self.collection, doc),
    )
    .await?;
    debug!(collection = %self.collection, %id, "inserted document");

    let mut stored = entity.clone();
    *stored.meta_mut() = Meta {
      id:         Some(id),
      created_at: Some(now),
      updated_at: Some(now),
    };
    Ok(stored)
  }

  pub async fn find_all(&self) -> Result<Vec<E>> {
    self.find_filtered(&Filter::All).await
  }

  pub async fn find_filtered(&self, filter: &Filter) -> Result<Vec<E>> {
    let docs = bounded(
      "find",
      self.timeouts.scan,
      self.store.find(&self.collection, filter),
    )
    .await?;
    docs.into_iter().map(from_document).collect()
  }

  pub async fn find_by_id(&self, id: Uuid) -> Result<E> {
    let doc = bounded(
      "find_one",
      self.timeouts.single,
      self.store.find_one(&self.collection, id),
    )
    .await?;
    match doc {
      Some(doc) => from_document(doc),
      None => Err(Error::NotFound { label: E::LABEL, id }),
    }
  }

  /// Merge the entity's set fields into the stored document and return the
  /// document as it now reads. `created_at` is preserved; `updated_at` is
  /// refreshed.
  pub async fn update_by_id(&self, id: Uuid, entity: &E) -> Result<E> {
    self.set_fields(id, to_document(entity)?).await
  }

  /// Merge raw fields into the stored document. Store-managed keys in `set`
  /// are ignored, apart from `updated_at`, which is always refreshed.
  pub async fn set_fields(&self, id: Uuid, mut set: Document) -> Result<E> {
    for key in Meta::KEYS {
      set.remove(key);
    }
    set.insert("updated_at".into(), serde_json::to_value(Utc::now())?);

    let matched = bounded(
      "update_one",
      self.timeouts.single,
      self.store.update_one(&self.collection, id, set),
    )
    .await?;
    if matched == 0 {
      return Err(Error::NotFound { label: E::LABEL, id });
    }
    self.find_by_id(id).await
  }

  pub async fn delete_by_id(&self, id: Uuid) -> Result<()> {
    let deleted = bounded(
      "delete_one",
      self.timeouts.single,
      self.store.delete_one(&self.collection, id),
    )
    .await?;
    if deleted == 0 {
      return Err(Error::NotFound { label: E::LABEL, id });
    }
    debug!(collection = %self.collection, %id, "deleted document");
    Ok(())
  }

  /// Round trip to the backend, bounded by `within`.
  pub async fn ping(&self, within: Duration) -> Result<()> {
    bounded("ping", within, self.store.ping()).await
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Serialize an entity into a document without its store-managed keys.
fn to_document<E: Entity>(entity: &E) -> Result<Document> {
  let mut doc = match serde_json::to_value(entity)? {
    Value::Object(map) => map,
    other => {
      return Err(Error::Serialization(serde::ser::Error::custom(format!(
        "{} did not serialize to an object: {other}",
        E::KIND
      ))));
    }
  };
  for key in Meta::KEYS {
    doc.remove(key);
  }
  Ok(doc)
}

fn from_document<E: Entity>(doc: Document) -> Result<E> {
  Ok(serde_json::from_value(Value::Object(doc))?)
}

async fn bounded<T, Err>(
  op: &'static str,
  after: Duration,
  call: impl Future<Output = Result<T, Err>>,
) -> Result<T>
where
  Err: std::error::Error + Send + Sync + 'static,
{
  match tokio::time::timeout(after, call).await {
    Ok(Ok(value)) => Ok(value),
    Ok(Err(e)) => Err(Error::Store(Box::new(e))),
    Err(_) => Err(Error::Timeout { op, after }),
  }
}
