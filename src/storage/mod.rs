//! Storage module for persisting crawl data
//!
//! This module is the persistence gateway of the crawler:
//! - SQLite database initialization and index management
//! - Page records, unique per (dataset, url)
//! - Link edges, unique per (dataset, from, to)
//! - Run tracking
//!
//! Duplicate-key conflicts are expected when runs overlap or repeat. The
//! unique indexes are the authority on one-record-per-key, so the gateway
//! swallows those conflicts instead of reporting them.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::url::CanonicalUrl;
use chrono::{DateTime, Utc};

/// Status recorded for a fetch that never produced an HTTP response
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// One fetched (or attempted) page of a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub dataset: String,
    pub url: CanonicalUrl,
    /// HTTP status code, or 0 when no response was received
    pub status: u16,
    /// Raw body text; `None` on failure
    pub html: Option<String>,
    /// In-boundary links found on the page, without the page itself
    pub out_links: Vec<CanonicalUrl>,
    pub fetched_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl PageRecord {
    /// Builds the record of a successful fetch
    pub fn fetched(
        dataset: &str,
        url: CanonicalUrl,
        status: u16,
        html: String,
        out_links: Vec<CanonicalUrl>,
    ) -> Self {
        Self {
            dataset: dataset.to_string(),
            url,
            status,
            html: Some(html),
            out_links,
            fetched_at: Utc::now(),
            error: None,
        }
    }

    /// Builds the record of a failed fetch
    pub fn failed(dataset: &str, url: CanonicalUrl, status: u16, error: String) -> Self {
        Self {
            dataset: dataset.to_string(),
            url,
            status,
            html: None,
            out_links: Vec::new(),
            fetched_at: Utc::now(),
            error: Some(error),
        }
    }

    /// Returns true if this page needs no further fetch
    ///
    /// A page is complete when it was fetched with a success status and a
    /// non-empty body, and no error was recorded.
    pub fn is_complete(&self) -> bool {
        (200..300).contains(&self.status)
            && self.error.is_none()
            && self.html.as_deref().is_some_and(|html| !html.is_empty())
    }
}

/// A directed link between two in-boundary pages of a dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkEdge {
    pub dataset: String,
    pub from: CanonicalUrl,
    pub to: CanonicalUrl,
}

impl LinkEdge {
    pub fn new(dataset: &str, from: CanonicalUrl, to: CanonicalUrl) -> Self {
        Self {
            dataset: dataset.to_string(),
            from,
            to,
        }
    }

    pub fn is_self_edge(&self) -> bool {
        self.from == self.to
    }
}

/// Result of a write that may hit a unique index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    /// The unique index already held this key; nothing was written
    AlreadyExists,
}

/// Represents a crawl run of one dataset
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub dataset: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub pages_fetched: u64,
    pub pages_failed: u64,
    pub pages_skipped: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
