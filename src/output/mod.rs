//! Output module for crawl reports and dataset statistics
//!
//! This module handles:
//! - Printing the report of a finished dataset crawl
//! - Loading and printing persisted per-dataset statistics

pub mod stats;

pub use stats::{load_statistics, print_statistics, DatasetStatistics};

use crate::state::CrawlReport;

/// Prints the report of one dataset crawl to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report: {} ===", report.dataset);
    println!("  Fetched:  {}", report.fetched);
    println!("  Failed:   {}", report.failed);
    println!("  Skipped:  {} (already complete)", report.skipped);
    println!("  Dropped:  {} (outside boundary)", report.dropped);
    if report.retried > 0 {
        println!("  Retried:  {} (earlier failures purged)", report.retried);
    }
    println!("  Edges written: {}", report.edges_written);
    if report.edge_write_errors > 0 {
        println!("  Edge write errors: {}", report.edge_write_errors);
    }
    println!("  Elapsed: {:.2?}", report.elapsed);
    println!();
}
