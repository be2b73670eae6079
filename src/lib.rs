//! Subtree Crawler: a scoped link-graph crawler
//!
//! This crate crawls a bounded subtree of a site starting from a dataset's seed
//! page and persists every fetched page together with the hyperlink graph
//! between pages. Reruns are resumable: pages already fetched successfully are
//! not fetched again, failed pages are retried.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("Failed to open database at {}: {source}", path.display())]
    Connection {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse '{raw}' as an absolute URL: {reason}")]
    Parse { raw: String, reason: String },

    #[error("Unsupported URL scheme '{scheme}' in '{raw}'")]
    UnsupportedScheme { raw: String, scheme: String },

    #[error("Missing host in URL '{0}'")]
    MissingHost(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, Runner, Target};
pub use crate::url::{canonicalize, in_boundary, site_root, Boundary, CanonicalUrl, Canonicalizer};
