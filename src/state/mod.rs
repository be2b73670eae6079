//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlOutcome`: the terminal outcome of one dequeued URL (dropped, skipped,
//!   failure recorded, done)
//! - `CrawlReport`: per-dataset counters accumulated from those outcomes

mod outcome;
mod report;

// Re-export main types
pub use outcome::UrlOutcome;
pub use report::CrawlReport;
