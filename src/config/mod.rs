//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every section is optional; a missing file means the built-in
//! defaults and dataset registry.
//!
//! # Example
//!
//! ```no_run
//! use subtree_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Database: {}", config.output.database_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BoundaryConfig, Config, CrawlerConfig, DatasetEntry, OutputConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, default_config_with_hash, hash_content, load_config,
    load_config_with_hash, parse_config,
};
