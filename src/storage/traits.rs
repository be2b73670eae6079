//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{LinkEdge, PageRecord, RunRecord, RunStatus, WriteOutcome};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// A unique index rejected the write. Backends swallow this before it
    /// reaches the crawler.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid timestamp in database: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Per-dataset persistence gateway
///
/// Every page and edge is partitioned by its dataset name. Writes that hit a
/// unique index are reported as [`WriteOutcome::AlreadyExists`] (or simply not
/// counted) and never as errors.
pub trait Storage {
    // ===== Indexes =====

    /// Creates the tables and unique indexes if they are absent
    fn ensure_indexes(&mut self) -> StorageResult<()>;

    // ===== Run Management =====

    /// Creates a new crawl run for a dataset
    fn create_run(&mut self, dataset: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run of a dataset
    fn get_latest_run(&self, dataset: &str) -> StorageResult<Option<RunRecord>>;

    /// Marks a run finished with its final status and counters
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        pages_fetched: u64,
        pages_failed: u64,
        pages_skipped: u64,
    ) -> StorageResult<()>;

    // ===== Pages =====

    /// Gets the page record for a URL of a dataset
    fn get_page(&self, dataset: &str, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Inserts a page record in a single write
    ///
    /// Returns [`WriteOutcome::AlreadyExists`] if a record for the same
    /// (dataset, url) is present.
    fn put_page(&mut self, record: &PageRecord) -> StorageResult<WriteOutcome>;

    /// Deletes the page record for a URL; returns whether one existed
    fn delete_page(&mut self, dataset: &str, url: &str) -> StorageResult<bool>;

    /// Removes a page record together with its outgoing edges
    ///
    /// Backends should make this atomic so a retried page is either fully
    /// purged or untouched.
    fn purge_page(&mut self, dataset: &str, url: &str) -> StorageResult<()> {
        self.delete_edges_from(dataset, url)?;
        self.delete_page(dataset, url)?;
        Ok(())
    }

    // ===== Edges =====

    /// Deletes all edges leaving a URL; returns the number deleted
    fn delete_edges_from(&mut self, dataset: &str, url: &str) -> StorageResult<usize>;

    /// Inserts edges in bulk, skipping duplicates and self-edges
    ///
    /// Returns the number of edges actually inserted.
    fn put_edges(&mut self, edges: &[LinkEdge]) -> StorageResult<usize>;

    /// Gets all edges leaving a URL
    fn get_edges_from(&self, dataset: &str, url: &str) -> StorageResult<Vec<LinkEdge>>;

    // ===== Statistics =====

    /// Counts page records of a dataset
    fn count_pages(&self, dataset: &str) -> StorageResult<u64>;

    /// Counts page records of a dataset that are not complete
    fn count_failed_pages(&self, dataset: &str) -> StorageResult<u64>;

    /// Counts edges of a dataset
    fn count_edges(&self, dataset: &str) -> StorageResult<u64>;
}
