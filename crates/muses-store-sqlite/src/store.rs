//! [`SqliteStore`]: the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use muses_core::{
  filter::Filter,
  store::{Document, DocumentStore},
};
use rusqlite::{
  OptionalExtension as _,
  functions::FunctionFlags,
  params_from_iter,
  types::{Value as SqlValue, ValueRef},
};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  query::compile,
  schema::{CASEFOLD, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A document store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  async fn init(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.create_scalar_function(
          CASEFOLD,
          1,
          FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
          |ctx| {
            Ok(match ctx.get_raw(0) {
              ValueRef::Text(bytes) => {
                Some(String::from_utf8_lossy(bytes).to_lowercase())
              }
              _ => None,
            })
          },
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Parse a stored body back into a document.
fn decode(id_hint: &str, body: &str) -> Result<Document> {
  match serde_json::from_str(body)? {
    Value::Object(map) => Ok(map),
    _ => Err(Error::Corrupt(id_hint.to_owned())),
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn insert(&self, collection: &str, mut doc: Document) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let id_str = id.hyphenated().to_string();
    doc.insert("_id".into(), Value::String(id_str.clone()));
    let body = Value::Object(doc).to_string();
    let collection = collection.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (collection, doc_id, body) VALUES (?1, ?2, ?3)",
          rusqlite::params![collection, id_str, body],
        )?;
        Ok(())
      })
      .await?;

    Ok(id)
  }

  async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
    let mut clause = String::new();
    let mut params = vec![SqlValue::Text(collection.to_owned())];
    compile(filter, &mut clause, &mut params);
    let sql = format!(
      "SELECT doc_id, body FROM documents
       WHERE collection = ? AND {clause}
       ORDER BY rowid"
    );
    debug!(%sql, "find");

    let rows: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows.iter().map(|(id, body)| decode(id, body)).collect()
  }

  async fn find_one(&self, collection: &str, id: Uuid) -> Result<Option<Document>> {
    let collection = collection.to_owned();
    let id_str = id.hyphenated().to_string();

    let body: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2",
              rusqlite::params![collection, id_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    body.map(|b| decode(&id.to_string(), &b)).transpose()
  }

  async fn update_one(&self, collection: &str, id: Uuid, set: Document) -> Result<u64> {
    let collection = collection.to_owned();
    let id_str = id.hyphenated().to_string();
    let patch = Value::Object(set).to_string();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE documents SET body = json_patch(body, ?3)
           WHERE collection = ?1 AND doc_id = ?2",
          rusqlite::params![collection, id_str, patch],
        )?)
      })
      .await?;

    Ok(changed as u64)
  }

  async fn delete_one(&self, collection: &str, id: Uuid) -> Result<u64> {
    let collection = collection.to_owned();
    let id_str = id.hyphenated().to_string();

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
          rusqlite::params![collection, id_str],
        )?)
      })
      .await?;

    Ok(deleted as u64)
  }

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
