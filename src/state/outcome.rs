//! Per-URL outcome definitions
//!
//! Every URL dequeued from the frontier ends in exactly one of these outcomes.

use crate::url::CanonicalUrl;
use std::fmt;

/// The terminal outcome of processing one dequeued URL
#[derive(Debug, Clone, PartialEq)]
pub enum UrlOutcome {
    /// Outside the dataset boundary; never fetched or recorded
    Dropped,

    /// Already complete from an earlier run; carries the persisted out-links
    /// so traversal continues past it
    Skipped { out_links: Vec<CanonicalUrl> },

    /// Fetch failed; a failure record was written
    FailureRecorded { status: u16, error: String },

    /// Fetched and recorded together with its edges
    Done {
        discovered: Vec<CanonicalUrl>,
        edges_written: usize,
    },
}

impl UrlOutcome {
    /// Short label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dropped => "dropped",
            Self::Skipped { .. } => "skipped",
            Self::FailureRecorded { .. } => "failed",
            Self::Done { .. } => "done",
        }
    }

    /// Links that should be offered to the frontier after this outcome
    pub fn links_to_follow(&self) -> &[CanonicalUrl] {
        match self {
            Self::Skipped { out_links } => out_links,
            Self::Done { discovered, .. } => discovered,
            Self::Dropped | Self::FailureRecorded { .. } => &[],
        }
    }

    /// Returns true if a page record was written for this URL in this run
    pub fn wrote_record(&self) -> bool {
        matches!(self, Self::FailureRecorded { .. } | Self::Done { .. })
    }
}

impl fmt::Display for UrlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailureRecorded { status, error } => {
                write!(f, "failed (status {}): {}", status, error)
            }
            Self::Done {
                discovered,
                edges_written,
            } => write!(
                f,
                "done ({} links, {} new edges)",
                discovered.len(),
                edges_written
            ),
            other => f.write_str(other.label()),
        }
    }
}
