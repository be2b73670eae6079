use crate::state::UrlOutcome;
use std::time::Duration;

/// Counters for one dataset crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub dataset: String,

    /// Pages fetched and recorded successfully
    pub fetched: u64,

    /// Pages whose fetch failed and were recorded as failures
    pub failed: u64,

    /// Pages already complete from an earlier run
    pub skipped: u64,

    /// URLs outside the boundary
    pub dropped: u64,

    /// Earlier failure records purged before refetching
    pub retried: u64,

    /// Edges inserted during this run
    pub edges_written: u64,

    /// Edge batches that could not be written
    pub edge_write_errors: u64,

    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn new(dataset: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            ..Self::default()
        }
    }

    /// Counts one URL outcome
    pub fn record(&mut self, outcome: &UrlOutcome) {
        match outcome {
            UrlOutcome::Dropped => self.dropped += 1,
            UrlOutcome::Skipped { .. } => self.skipped += 1,
            UrlOutcome::FailureRecorded { .. } => self.failed += 1,
            UrlOutcome::Done { edges_written, .. } => {
                self.fetched += 1;
                self.edges_written += *edges_written as u64;
            }
        }
    }

    /// Number of URLs that reached a terminal outcome
    pub fn processed(&self) -> u64 {
        self.fetched + self.failed + self.skipped + self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_each_outcome() {
        let mut report = CrawlReport::new("tinyfruits");

        report.record(&UrlOutcome::Dropped);
        report.record(&UrlOutcome::Skipped { out_links: vec![] });
        report.record(&UrlOutcome::FailureRecorded {
            status: 0,
            error: "timeout".to_string(),
        });
        report.record(&UrlOutcome::Done {
            discovered: vec![],
            edges_written: 3,
        });
        report.record(&UrlOutcome::Done {
            discovered: vec![],
            edges_written: 2,
        });

        assert_eq!(report.dataset, "tinyfruits");
        assert_eq!(report.dropped, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.fetched, 2);
        assert_eq!(report.edges_written, 5);
        assert_eq!(report.processed(), 5);
    }
}
