//! Crawl frontier: the FIFO work queue plus the per-run seen-set
//!
//! Every canonical URL is admitted at most once per run. Admission marks the
//! URL as seen, so a URL is never queued twice and never re-queued after it
//! has been dequeued, whatever its outcome. The seen-set lives only in memory;
//! across runs the storage layer's unique indexes are authoritative.

use crate::url::CanonicalUrl;
use std::collections::{HashSet, VecDeque};

/// Breadth-first frontier of one dataset crawl
#[derive(Debug, Default)]
pub struct Frontier {
    /// URLs waiting to be processed, oldest first
    queue: VecDeque<CanonicalUrl>,

    /// Every URL ever admitted in this run
    seen: HashSet<CanonicalUrl>,

    /// Number of URLs handed out by `dequeue`
    dequeued: usize,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a URL unless it has already been seen in this run
    ///
    /// # Returns
    ///
    /// `true` if the URL was queued, `false` if it was already seen
    pub fn enqueue(&mut self, url: CanonicalUrl) -> bool {
        if self.seen.contains(&url) {
            return false;
        }

        self.seen.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    /// Admits every URL of a page's link set, in order
    ///
    /// Returns the number of URLs actually queued.
    pub fn enqueue_all<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = CanonicalUrl>,
    {
        urls.into_iter().filter(|url| self.enqueue(url.clone())).count()
    }

    /// Removes and returns the oldest queued URL
    pub fn dequeue(&mut self) -> Option<CanonicalUrl> {
        let url = self.queue.pop_front()?;
        self.dequeued += 1;
        Some(url)
    }

    /// Number of URLs waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns true if the URL was admitted at some point in this run
    pub fn has_seen(&self, url: &CanonicalUrl) -> bool {
        self.seen.contains(url)
    }

    /// Number of distinct URLs admitted in this run
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Number of URLs handed out so far
    pub fn dequeued_count(&self) -> usize {
        self.dequeued
    }
}
