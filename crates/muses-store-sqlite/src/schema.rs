//! SQL schema for the MuSES SQLite document store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per document. Collections are a key prefix, not separate tables,
-- so new collections need no DDL.
CREATE TABLE IF NOT EXISTS documents (
    collection  TEXT NOT NULL,
    doc_id      TEXT NOT NULL,   -- hyphenated UUID, mirrored as body._id
    body        TEXT NOT NULL CHECK (json_valid(body)),
    PRIMARY KEY (collection, doc_id)
);

PRAGMA user_version = 1;
";

/// Name of the SQL function used for case-insensitive comparisons.
///
/// SQLite's built-in `lower()` and `LIKE` only fold ASCII; this one applies
/// full Unicode lowercasing.
pub const CASEFOLD: &str = "casefold";
