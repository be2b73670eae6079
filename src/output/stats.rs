//! Statistics from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! per-dataset crawl statistics from the storage layer.

use crate::storage::{RunRecord, Storage, StorageResult};

/// Persisted state of one dataset
#[derive(Debug, Clone)]
pub struct DatasetStatistics {
    pub dataset: String,

    /// Page records of the dataset, complete or not
    pub total_pages: u64,

    /// Page records that a rerun would fetch again
    pub failed_pages: u64,

    /// Link edges of the dataset
    pub total_edges: u64,

    /// Most recent crawl run, if any
    pub last_run: Option<RunRecord>,
}

impl DatasetStatistics {
    /// Page records that are complete
    pub fn complete_pages(&self) -> u64 {
        self.total_pages.saturating_sub(self.failed_pages)
    }
}

/// Loads statistics for one dataset from storage
pub fn load_statistics(storage: &dyn Storage, dataset: &str) -> StorageResult<DatasetStatistics> {
    Ok(DatasetStatistics {
        dataset: dataset.to_string(),
        total_pages: storage.count_pages(dataset)?,
        failed_pages: storage.count_failed_pages(dataset)?,
        total_edges: storage.count_edges(dataset)?,
        last_run: storage.get_latest_run(dataset)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &DatasetStatistics) {
    println!("=== Dataset: {} ===", stats.dataset);

    let success_rate = if stats.total_pages > 0 {
        (stats.complete_pages() as f64 / stats.total_pages as f64) * 100.0
    } else {
        0.0
    };

    println!("  Pages: {}", stats.total_pages);
    println!(
        "  Complete: {} ({:.1}%)",
        stats.complete_pages(),
        success_rate
    );
    println!("  Failed (retried on next run): {}", stats.failed_pages);
    println!("  Edges: {}", stats.total_edges);

    match &stats.last_run {
        Some(run) => {
            println!(
                "  Last run: #{} {} (started {}, finished {})",
                run.id,
                run.status.to_db_string(),
                run.started_at,
                run.finished_at.as_deref().unwrap_or("-")
            );
            println!(
                "    fetched {}, failed {}, skipped {}",
                run.pages_fetched, run.pages_failed, run.pages_skipped
            );
        }
        None => println!("  Last run: never crawled"),
    }
    println!();
}
