//! SQLite backend for the observer item store.
//!
//! This module provides:
//! - `Database`: Core SQLite connection and schema management
//! - `embedding`: BLOB conversion for embedding vectors

pub mod embedding;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tracing::debug;

use crate::item::Item;
use crate::store::ItemStore;

pub use self::embedding::vec_to_blob;

/// Error types for SQLite operations.
#[derive(Debug)]
pub enum Error {
    Sqlite(String),
    InvalidItem(String),
    UnknownItem(String),
    InvalidEmbedding(String),
    InvalidBlobSize { expected: usize, actual: usize },
    InvalidTimestamp(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Sqlite(msg) => write!(f, "Database error: {}", msg),
            Error::InvalidItem(msg) => write!(f, "Invalid item: {}", msg),
            Error::UnknownItem(id) => write!(f, "No item found with id: {}", id),
            Error::InvalidEmbedding(msg) => write!(f, "Invalid embedding: {}", msg),
            Error::InvalidBlobSize { expected, actual } => {
                write!(
                    f,
                    "Invalid BLOB size: expected {} bytes, got {} bytes",
                    expected, actual
                )
            }
            Error::InvalidTimestamp(msg) => write!(f, "Invalid timestamp: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Sqlite(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// SQLite database backend for observer items and embeddings.
pub struct Database {
    conn: Connection,
}

/// Initialize database schema and create necessary tables.
fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            source_type TEXT NOT NULL,
            source_name TEXT NOT NULL,
            title TEXT NOT NULL,
            summary TEXT NOT NULL,
            url TEXT NOT NULL,
            author TEXT NOT NULL,
            published_at TEXT NOT NULL,
            fetched_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS embeddings (
            item_id TEXT PRIMARY KEY REFERENCES items(id) ON DELETE CASCADE,
            dims INTEGER NOT NULL,
            vector BLOB NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| Error::InvalidTimestamp(format!("{raw}: {e}")))
}

/// Item row as stored, with timestamps still in text form.
struct StoredItem {
    id: String,
    source_type: String,
    source_name: String,
    title: String,
    summary: String,
    url: String,
    author: String,
    published_at: String,
    fetched_at: String,
}

impl StoredItem {
    fn into_item(self) -> Result<Item> {
        Ok(Item {
            published_at: parse_timestamp(&self.published_at)?,
            fetched_at: parse_timestamp(&self.fetched_at)?,
            id: self.id,
            source_type: self.source_type,
            source_name: self.source_name,
            title: self.title,
            summary: self.summary,
            url: self.url,
            author: self.author,
        })
    }
}

impl Database {
    /// Open or create a SQLite database at the given path.
    ///
    /// Initializes the schema if the database is new.
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened or schema initialization fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        create_schema(&conn)?;
        debug!(path = %path.display(), "opened item store");
        Ok(Self { conn })
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns error if schema initialization fails.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Insert or replace items in a single transaction.
    ///
    /// An existing row with the same id is overwritten. Returns the number of
    /// items written.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidItem` if any item has an empty id (nothing is
    /// written in that case), or an error if the database write fails.
    pub fn save_items(&mut self, items: &[Item]) -> Result<usize> {
        if let Some(bad) = items.iter().position(|item| !item.has_valid_id()) {
            return Err(Error::InvalidItem(format!(
                "item at index {} has an empty id",
                bad
            )));
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO items (id, source_type, source_name, title, summary, url, author, published_at, fetched_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(id) DO UPDATE SET
                    source_type = excluded.source_type,
                    source_name = excluded.source_name,
                    title = excluded.title,
                    summary = excluded.summary,
                    url = excluded.url,
                    author = excluded.author,
                    published_at = excluded.published_at,
                    fetched_at = excluded.fetched_at
                "#,
            )?;
            for item in items {
                stmt.execute(params![
                    &item.id,
                    &item.source_type,
                    &item.source_name,
                    &item.title,
                    &item.summary,
                    &item.url,
                    &item.author,
                    format_timestamp(&item.published_at),
                    format_timestamp(&item.fetched_at),
                ])?;
            }
        }
        tx.commit()?;

        debug!(count = items.len(), "saved items");
        Ok(items.len())
    }

    /// Insert or replace the embedding for an existing item.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEmbedding` for empty or non-finite vectors,
    /// `Error::UnknownItem` if no item has `item_id`, or an error if the
    /// database write fails.
    pub fn save_embedding(&mut self, item_id: &str, vector: &[f32]) -> Result<()> {
        let blob = vec_to_blob(vector)?;

        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM items WHERE id = ?1)",
            [item_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(Error::UnknownItem(item_id.to_string()));
        }

        self.conn.execute(
            r#"
            INSERT INTO embeddings (item_id, dims, vector)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(item_id) DO UPDATE SET dims = excluded.dims, vector = excluded.vector
            "#,
            params![item_id, vector.len() as i64, &blob],
        )?;

        debug!(item_id, dims = vector.len(), "saved embedding");
        Ok(())
    }

    /// Retrieve a single item by ID.
    ///
    /// Returns None if the item does not exist.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails or a stored timestamp is malformed.
    pub fn get_item(&self, id: &str) -> Result<Option<Item>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, source_type, source_name, title, summary, url, author, published_at, fetched_at
            FROM items
            WHERE id = ?1
            "#,
        )?;

        let raw = stmt
            .query_row([id], |row| {
                Ok(StoredItem {
                    id: row.get(0)?,
                    source_type: row.get(1)?,
                    source_name: row.get(2)?,
                    title: row.get(3)?,
                    summary: row.get(4)?,
                    url: row.get(5)?,
                    author: row.get(6)?,
                    published_at: row.get(7)?,
                    fetched_at: row.get(8)?,
                })
            })
            .optional()?;

        raw.map(StoredItem::into_item).transpose()
    }

    /// Retrieve the embedding stored for an item.
    ///
    /// Returns None if the item has no embedding.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails or the stored BLOB is corrupt.
    pub fn get_embedding(&self, item_id: &str) -> Result<Option<Vec<f32>>> {
        let row: Option<(i64, Vec<u8>)> = self
            .conn
            .query_row(
                "SELECT dims, vector FROM embeddings WHERE item_id = ?1",
                [item_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((dims, blob)) => {
                let dims = usize::try_from(dims).map_err(|_| {
                    Error::InvalidEmbedding(format!("stored dimension count {} is negative", dims))
                })?;
                Ok(Some(embedding::blob_to_vec(&blob, dims)?))
            }
            None => Ok(None),
        }
    }

    /// Count stored items.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub fn count_items(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Count stored embeddings.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub fn count_embeddings(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Close the underlying connection, reporting any error SQLite raises.
    ///
    /// # Errors
    ///
    /// Returns error if SQLite refuses to close (e.g. unfinalized statements).
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::from(e))
    }

    /// Get internal connection (for internal use, e.g., tests).
    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl ItemStore for Database {
    type Error = Error;

    fn save_items(&mut self, items: &[Item]) -> Result<usize> {
        Database::save_items(self, items)
    }

    fn save_embedding(&mut self, item_id: &str, vector: &[f32]) -> Result<()> {
        Database::save_embedding(self, item_id, vector)
    }

    fn close(self) -> Result<()> {
        Database::close(self)
    }
}
