//! Crawler module for page fetching and link-graph recording
//!
//! This module contains the core crawling logic, including:
//! - The dataset registry and the runner that drives crawls
//! - The breadth-first frontier
//! - HTTP fetching with bounded retry
//! - HTML link extraction
//! - The fetch-and-record pipeline

mod fetcher;
mod frontier;
mod parser;
mod pipeline;
mod registry;
mod runner;

pub use fetcher::{build_http_client, fetch_url, fetch_with_retry, FetchOutcome, RetryPolicy};
pub use frontier::Frontier;
pub use parser::extract_links;
pub use pipeline::Pipeline;
pub use registry::{DatasetRegistry, Target, ALL_TARGET, BUILTIN_DATASETS};
pub use runner::Runner;

pub use crate::state::CrawlReport;
