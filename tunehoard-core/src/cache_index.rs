use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use std::path::Path;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

const SCHEMA_SQL: &str = r"
-- Durable content id -> cached file name mapping
CREATE TABLE IF NOT EXISTS cache_index (
    content_id TEXT PRIMARY KEY,
    file_name TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    accessed_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cache_index_file_name ON cache_index(file_name);
";

/// One row of the stream cache index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheIndexEntry {
    pub content_id: String,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub accessed_at: DateTime<Utc>,
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<CacheIndexEntry> {
    Ok(CacheIndexEntry {
        content_id: row.get(0)?,
        file_name: row.get(1)?,
        created_at: DateTime::from_timestamp_millis(row.get::<_, i64>(2)?)
            .unwrap_or_else(Utc::now),
        accessed_at: DateTime::from_timestamp_millis(row.get::<_, i64>(3)?)
            .unwrap_or_else(Utc::now),
    })
}

/// SQLite-backed `content_id -> file_name` mapping that survives restarts.
///
/// The index only records names; whether the file still exists is checked by
/// [`BoundedMediaCache`](crate::BoundedMediaCache), which owns the directory.
pub struct CacheIndex {
    conn: Connection,
}

impl CacheIndex {
    /// Open an index at a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub async fn open(path: &Path) -> Result<Self> {
        info!("Opening stream cache index at {:?}", path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).await?;
        Self::init(conn).await
    }

    /// Open a throwaway in-memory index
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA_SQL)?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            Ok(())
        })
        .await?;

        debug!("Stream cache index initialized");
        Ok(Self { conn })
    }

    /// Look up the entry for a content id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, content_id: &str) -> Result<Option<CacheIndexEntry>> {
        let id = content_id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(
                    r"
                    SELECT content_id, file_name, created_at, accessed_at
                    FROM cache_index
                    WHERE content_id = ?1
                ",
                )?;
                let entry = stmt.query_row([id], row_to_entry).optional()?;
                Ok(entry)
            })
            .await
            .map_err(Into::into)
    }

    /// Record (or overwrite) the file backing a content id
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be written.
    pub async fn put(&self, content_id: &str, file_name: &str) -> Result<()> {
        debug!("Indexing {} -> {}", content_id, file_name);
        let id = content_id.to_string();
        let file_name = file_name.to_string();
        let now = Utc::now().timestamp_millis();

        self.conn
            .call(move |conn| {
                conn.execute(
                    r"
                    INSERT INTO cache_index (content_id, file_name, created_at, accessed_at)
                    VALUES (?1, ?2, ?3, ?3)
                    ON CONFLICT(content_id) DO UPDATE SET
                        file_name = excluded.file_name,
                        created_at = excluded.created_at,
                        accessed_at = excluded.accessed_at
                ",
                    rusqlite::params![id, file_name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Into::into)
    }

    /// Refresh the access time of an entry
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn touch(&self, content_id: &str) -> Result<()> {
        let id = content_id.to_string();
        let now = Utc::now().timestamp_millis();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE cache_index SET accessed_at = ?2 WHERE content_id = ?1",
                    rusqlite::params![id, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Into::into)
    }

    /// Remove the entry for a content id, returning whether one existed
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn remove(&self, content_id: &str) -> Result<bool> {
        let id = content_id.to_string();

        self.conn
            .call(move |conn| {
                let deleted =
                    conn.execute("DELETE FROM cache_index WHERE content_id = ?1", [id])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Into::into)
    }

    /// Remove every entry pointing at `file_name`
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn remove_by_file_name(&self, file_name: &str) -> Result<usize> {
        let file_name = file_name.to_string();

        self.conn
            .call(move |conn| {
                let deleted =
                    conn.execute("DELETE FROM cache_index WHERE file_name = ?1", [file_name])?;
                Ok(deleted)
            })
            .await
            .map_err(Into::into)
    }

    /// Remove all entries
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn clear(&self) -> Result<usize> {
        self.conn
            .call(|conn| {
                let deleted = conn.execute("DELETE FROM cache_index", [])?;
                Ok(deleted)
            })
            .await
            .map_err(Into::into)
    }

    /// Number of entries
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn len(&self) -> Result<usize> {
        self.conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_index", [], |row| row.get(0))?;
                Ok(usize::try_from(count).unwrap_or(0))
            })
            .await
            .map_err(Into::into)
    }

    /// Whether the index has no entries
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Checkpoint WAL for clean shutdown
    ///
    /// # Errors
    ///
    /// Returns an error if the WAL checkpoint fails.
    pub async fn checkpoint(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")?;
                Ok(())
            })
            .await
            .map_err(Into::into)
    }
}
