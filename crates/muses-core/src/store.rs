//! The `DocumentStore` trait.
//!
//! Implemented by storage backends (e.g. `muses-store-sqlite`). The
//! repository and everything above it depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::filter::Filter;

/// A stored document: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// Abstraction over a schemaless, collection-partitioned document store.
///
/// Every document carries its identifier under `_id`. Writes are atomic per
/// document; there are no multi-document transactions.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `doc` under a freshly generated identifier, which is also
  /// written into the stored body as `_id`. Any `_id` already in `doc` is
  /// replaced.
  fn insert<'a>(
    &'a self,
    collection: &'a str,
    doc: Document,
  ) -> impl Future<Output = Result<Uuid, Self::Error>> + Send + 'a;

  /// All documents matching `filter`, in insertion order.
  fn find<'a>(
    &'a self,
    collection: &'a str,
    filter: &'a Filter,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + 'a;

  /// Retrieve one document by identifier. Returns `None` if not found.
  fn find_one<'a>(
    &'a self,
    collection: &'a str,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + 'a;

  /// Merge `set` into the stored document: every key present in `set`
  /// replaces the stored value, every other stored key is kept. Returns
  /// the number of documents matched (0 or 1).
  fn update_one<'a>(
    &'a self,
    collection: &'a str,
    id: Uuid,
    set: Document,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Remove one document. Returns the number of documents deleted (0 or 1).
  fn delete_one<'a>(
    &'a self,
    collection: &'a str,
    id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Cheap round trip proving the backend is reachable.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
