//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{LinkEdge, PageRecord, RunRecord, RunStatus, WriteOutcome};
use crate::url::CanonicalUrl;
use crate::CrawlError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// Returns true if SQLite rejected a write because of a unique index
fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}

/// Maps a SQLite error onto the storage taxonomy
fn classify(err: rusqlite::Error) -> StorageError {
    if is_duplicate_key(&err) {
        StorageError::DuplicateKey(err.to_string())
    } else {
        StorageError::Sqlite(err)
    }
}

/// Raw page columns, converted outside the row closure so JSON and timestamp
/// errors surface as storage errors
struct PageRow {
    dataset: String,
    url: String,
    status: u16,
    html: Option<String>,
    out_links: String,
    fetched_at: String,
    error: Option<String>,
}

impl PageRow {
    const COLUMNS: &'static str = "dataset, url, status, html, out_links, fetched_at, error";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            dataset: row.get(0)?,
            url: row.get(1)?,
            status: row.get(2)?,
            html: row.get(3)?,
            out_links: row.get(4)?,
            fetched_at: row.get(5)?,
            error: row.get(6)?,
        })
    }

    fn into_record(self) -> StorageResult<PageRecord> {
        let out_links: Vec<String> = serde_json::from_str(&self.out_links)?;
        Ok(PageRecord {
            dataset: self.dataset,
            url: CanonicalUrl::from_stored(self.url),
            status: self.status,
            html: self.html,
            out_links: out_links.into_iter().map(CanonicalUrl::from_stored).collect(),
            fetched_at: self.fetched_at.parse::<DateTime<Utc>>()?,
            error: self.error,
        })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        dataset: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Failed),
        pages_fetched: row.get::<_, i64>(6)? as u64,
        pages_failed: row.get::<_, i64>(7)? as u64,
        pages_skipped: row.get::<_, i64>(8)? as u64,
    })
}

const RUN_COLUMNS: &str =
    "id, dataset, started_at, finished_at, config_hash, status, pages_fetched, pages_failed, pages_skipped";

/// SQLite storage backend
///
/// Holds the single connection used for the whole process lifetime.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path` and ensures the schema
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(CrawlError::Connection)` - The database cannot be opened
    pub fn new(path: &Path) -> Result<Self, CrawlError> {
        let connection_error = |source| CrawlError::Connection {
            path: path.to_path_buf(),
            source,
        };

        let conn = Connection::open(path).map_err(connection_error)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )
        .map_err(connection_error)?;

        initialize_schema(&conn).map_err(connection_error)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database, for tests and throwaway crawls
    pub fn open_in_memory() -> Result<Self, CrawlError> {
        let connection_error = |source| CrawlError::Connection {
            path: ":memory:".into(),
            source,
        };

        let conn = Connection::open_in_memory().map_err(connection_error)?;
        initialize_schema(&conn).map_err(connection_error)?;
        Ok(Self { conn })
    }
}

impl Storage for SqliteStorage {
    fn ensure_indexes(&mut self) -> StorageResult<()> {
        initialize_schema(&self.conn)?;
        Ok(())
    }

    // ===== Run Management =====

    fn create_run(&mut self, dataset: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (dataset, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![dataset, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self, dataset: &str) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM runs WHERE dataset = ?1 ORDER BY id DESC LIMIT 1",
                    RUN_COLUMNS
                ),
                params![dataset],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        pages_fetched: u64,
        pages_failed: u64,
        pages_skipped: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_fetched = ?3,
             pages_failed = ?4, pages_skipped = ?5 WHERE id = ?6",
            params![
                status.to_db_string(),
                now,
                pages_fetched as i64,
                pages_failed as i64,
                pages_skipped as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Pages =====

    fn get_page(&self, dataset: &str, url: &str) -> StorageResult<Option<PageRecord>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM pages WHERE dataset = ?1 AND url = ?2",
                    PageRow::COLUMNS
                ),
                params![dataset, url],
                PageRow::from_row,
            )
            .optional()?;

        row.map(PageRow::into_record).transpose()
    }

    fn put_page(&mut self, record: &PageRecord) -> StorageResult<WriteOutcome> {
        let out_links: Vec<&str> = record.out_links.iter().map(|u| u.as_str()).collect();
        let out_links = serde_json::to_string(&out_links)?;

        let result = self.conn.execute(
            "INSERT INTO pages (dataset, url, status, html, out_links, fetched_at, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.dataset,
                record.url.as_str(),
                record.status,
                record.html,
                out_links,
                record.fetched_at.to_rfc3339(),
                record.error,
            ],
        );

        match result.map_err(classify) {
            Ok(_) => Ok(WriteOutcome::Inserted),
            Err(StorageError::DuplicateKey(reason)) => {
                tracing::debug!(
                    "Page {} already recorded for {}: {}",
                    record.url,
                    record.dataset,
                    reason
                );
                Ok(WriteOutcome::AlreadyExists)
            }
            Err(e) => Err(e),
        }
    }

    fn delete_page(&mut self, dataset: &str, url: &str) -> StorageResult<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM pages WHERE dataset = ?1 AND url = ?2",
            params![dataset, url],
        )?;
        Ok(deleted > 0)
    }

    fn purge_page(&mut self, dataset: &str, url: &str) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM edges WHERE dataset = ?1 AND from_url = ?2",
            params![dataset, url],
        )?;
        tx.execute(
            "DELETE FROM pages WHERE dataset = ?1 AND url = ?2",
            params![dataset, url],
        )?;
        tx.commit()?;
        Ok(())
    }

    // ===== Edges =====

    fn delete_edges_from(&mut self, dataset: &str, url: &str) -> StorageResult<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM edges WHERE dataset = ?1 AND from_url = ?2",
            params![dataset, url],
        )?;
        Ok(deleted)
    }

    fn put_edges(&mut self, edges: &[LinkEdge]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;

        {
            let mut stmt =
                tx.prepare("INSERT INTO edges (dataset, from_url, to_url) VALUES (?1, ?2, ?3)")?;

            for edge in edges.iter().filter(|edge| !edge.is_self_edge()) {
                let result = stmt.execute(params![
                    edge.dataset,
                    edge.from.as_str(),
                    edge.to.as_str()
                ]);

                match result.map_err(classify) {
                    Ok(_) => inserted += 1,
                    Err(StorageError::DuplicateKey(_)) => {}
                    Err(e) => return Err(e),
                }
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn get_edges_from(&self, dataset: &str, url: &str) -> StorageResult<Vec<LinkEdge>> {
        let mut stmt = self.conn.prepare(
            "SELECT dataset, from_url, to_url FROM edges
             WHERE dataset = ?1 AND from_url = ?2 ORDER BY id",
        )?;

        let edges = stmt
            .query_map(params![dataset, url], |row| {
                Ok(LinkEdge {
                    dataset: row.get(0)?,
                    from: CanonicalUrl::from_stored(row.get(1)?),
                    to: CanonicalUrl::from_stored(row.get(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(edges)
    }

    // ===== Statistics =====

    fn count_pages(&self, dataset: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE dataset = ?1",
            params![dataset],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_failed_pages(&self, dataset: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE dataset = ?1
             AND (status < 200 OR status >= 300 OR error IS NOT NULL
                  OR html IS NULL OR html = '')",
            params![dataset],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_edges(&self, dataset: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM edges WHERE dataset = ?1",
            params![dataset],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
