//! Fetch-and-record pipeline - the crawl loop of one dataset
//!
//! The pipeline owns the frontier and the storage handle. For each dequeued
//! URL it:
//! - Drops it if it lies outside the boundary
//! - Skips it if a complete record already exists, following the stored links
//!   and rewriting any of its edges that are missing
//! - Purges an earlier failure record (page and outgoing edges) so the URL is
//!   fetched again
//! - Fetches and extracts links in a spawned task
//! - Writes the page record in one step, then its edges
//! - Enqueues the in-boundary links
//!
//! Only network I/O and HTML parsing run in spawned tasks. Admission and all
//! writes happen on the pipeline's own task, so a URL is claimed exactly once
//! and the purge, insert and edge writes for one URL never interleave.

use crate::crawler::fetcher::{fetch_with_retry, FetchOutcome, RetryPolicy};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::extract_links;
use crate::state::{CrawlReport, UrlOutcome};
use crate::storage::{LinkEdge, PageRecord, Storage, WriteOutcome, TRANSPORT_FAILURE_STATUS};
use crate::url::{Boundary, CanonicalUrl, Canonicalizer};
use crate::Result;
use reqwest::Client;
use std::collections::HashMap;
use std::future::Future;
use std::time::Instant;
use tokio::task::{self, JoinSet};

/// Number of processed URLs between progress lines
const PROGRESS_INTERVAL: u64 = 10;

/// What the spawned fetch task hands back
#[derive(Debug)]
enum FetchedPage {
    Page {
        status: u16,
        html: String,
        links: Vec<CanonicalUrl>,
    },
    Failure {
        status: u16,
        error: String,
    },
}

/// Decision taken for a URL before any network activity
#[derive(Debug)]
enum Admission {
    /// No fetch needed; the outcome is already known
    Settled(UrlOutcome),
    Fetch,
}

/// Crawl loop of one dataset
pub struct Pipeline<'a, S: Storage> {
    dataset: String,
    boundary: Boundary,
    canonicalizer: Canonicalizer,
    storage: &'a mut S,
    client: Client,
    retry: RetryPolicy,
    max_in_flight: usize,
    frontier: Frontier,
    in_flight: JoinSet<(CanonicalUrl, FetchedPage)>,
    /// URL of every spawned task, so a task that dies still gets a record
    task_urls: HashMap<task::Id, CanonicalUrl>,
    report: CrawlReport,
    started: Instant,
}

impl<'a, S: Storage> Pipeline<'a, S> {
    /// Creates a sequential pipeline without in-run retries
    pub fn new(
        dataset: &str,
        boundary: Boundary,
        canonicalizer: Canonicalizer,
        storage: &'a mut S,
        client: Client,
    ) -> Self {
        Self {
            dataset: dataset.to_string(),
            boundary,
            canonicalizer,
            storage,
            client,
            retry: RetryPolicy::none(),
            max_in_flight: 1,
            frontier: Frontier::new(),
            in_flight: JoinSet::new(),
            task_urls: HashMap::new(),
            report: CrawlReport::new(dataset),
            started: Instant::now(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the number of fetches allowed in flight at once (at least 1)
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Counters accumulated so far; after a failed run these are partial
    pub fn report(&self) -> &CrawlReport {
        &self.report
    }

    /// Crawls from the seed until the frontier is exhausted
    ///
    /// Page-level failures are recorded and the crawl continues. Storage
    /// errors other than duplicate keys abort the crawl; the counters up to
    /// that point stay available through [`Pipeline::report`].
    pub async fn run(&mut self, seed: CanonicalUrl) -> Result<CrawlReport> {
        self.started = Instant::now();
        self.frontier.enqueue(seed);

        let result = self.drain().await;
        self.report.elapsed = self.started.elapsed();

        result.map(|()| self.report.clone())
    }

    async fn drain(&mut self) -> Result<()> {
        loop {
            while self.in_flight.len() < self.max_in_flight {
                let Some(url) = self.frontier.dequeue() else {
                    break;
                };

                match self.admit(&url)? {
                    Admission::Settled(outcome) => self.settle(&url, outcome),
                    Admission::Fetch => self.spawn_fetch(url),
                }
            }

            if !self.join_one().await? {
                tracing::debug!("Frontier is empty for dataset {}", self.dataset);
                return Ok(());
            }
        }
    }

    /// Decides what to do with a dequeued URL, consulting stored state
    fn admit(&mut self, url: &CanonicalUrl) -> Result<Admission> {
        if !self.boundary.contains(url) {
            return Ok(Admission::Settled(UrlOutcome::Dropped));
        }

        match self.storage.get_page(&self.dataset, url.as_str())? {
            Some(page) if page.is_complete() => {
                // Edges of a complete page may be missing if an earlier run
                // stopped between the page write and the edge write
                let restored = self.write_edges(url, &page.out_links);
                if restored > 0 {
                    tracing::debug!("Restored {} edges from {}", restored, url);
                }
                self.report.edges_written += restored as u64;

                Ok(Admission::Settled(UrlOutcome::Skipped {
                    out_links: page.out_links,
                }))
            }
            Some(page) => {
                tracing::debug!(
                    "Retrying {} (previous status {}, error {:?})",
                    url,
                    page.status,
                    page.error
                );
                self.storage.purge_page(&self.dataset, url.as_str())?;
                self.report.retried += 1;
                Ok(Admission::Fetch)
            }
            None => Ok(Admission::Fetch),
        }
    }

    fn spawn_fetch(&mut self, url: CanonicalUrl) {
        let client = self.client.clone();
        let canonicalizer = self.canonicalizer.clone();
        let retry = self.retry;
        let target = url.as_str().to_string();

        tracing::debug!("Fetching {}", url);

        self.spawn_task(url, async move {
            match fetch_with_retry(&client, &target, retry).await {
                FetchOutcome::Fetched {
                    final_url,
                    status,
                    body,
                } => {
                    let links = extract_links(&body, &final_url, &canonicalizer);
                    FetchedPage::Page {
                        status,
                        html: body,
                        links,
                    }
                }
                FetchOutcome::Failed { status, error, .. } => FetchedPage::Failure { status, error },
            }
        });
    }

    fn spawn_task<F>(&mut self, url: CanonicalUrl, task: F)
    where
        F: Future<Output = FetchedPage> + Send + 'static,
    {
        let task_url = url.clone();
        let handle = self.in_flight.spawn(async move { (task_url, task.await) });
        self.task_urls.insert(handle.id(), url);
    }

    /// Waits for one spawned task and records its result
    ///
    /// A task that panicked or was cancelled is recorded as a transport
    /// failure of its URL. Returns false once nothing is in flight.
    async fn join_one(&mut self) -> Result<bool> {
        let Some(joined) = self.in_flight.join_next_with_id().await else {
            return Ok(false);
        };

        let (url, page) = match joined {
            Ok((id, (url, page))) => {
                self.task_urls.remove(&id);
                (url, page)
            }
            Err(e) => {
                let Some(url) = self.task_urls.remove(&e.id()) else {
                    tracing::error!("Untracked fetch task of dataset {} failed: {}", self.dataset, e);
                    return Ok(true);
                };

                let error = if e.is_panic() {
                    format!("fetch task panicked: {}", e)
                } else {
                    format!("fetch task cancelled: {}", e)
                };
                (
                    url,
                    FetchedPage::Failure {
                        status: TRANSPORT_FAILURE_STATUS,
                        error,
                    },
                )
            }
        };

        let outcome = self.record(&url, page)?;
        self.settle(&url, outcome);
        Ok(true)
    }

    /// Persists the result of a fetch
    ///
    /// The page record is written in a single insert once status and body
    /// (or error) are both known. Edge write failures are logged and counted
    /// but do not fail the page; the next run rewrites them.
    fn record(&mut self, url: &CanonicalUrl, page: FetchedPage) -> Result<UrlOutcome> {
        match page {
            FetchedPage::Failure { status, error } => {
                tracing::warn!("Failed to fetch {} (status {}): {}", url, status, error);

                let record = PageRecord::failed(&self.dataset, url.clone(), status, error.clone());
                if self.storage.put_page(&record)? == WriteOutcome::AlreadyExists {
                    tracing::debug!("Record for {} already exists", url);
                }

                Ok(UrlOutcome::FailureRecorded { status, error })
            }
            FetchedPage::Page {
                status,
                html,
                links,
            } => {
                let out_links: Vec<CanonicalUrl> = links
                    .into_iter()
                    .filter(|link| self.boundary.contains(link) && link != url)
                    .collect();

                let record =
                    PageRecord::fetched(&self.dataset, url.clone(), status, html, out_links.clone());
                if self.storage.put_page(&record)? == WriteOutcome::AlreadyExists {
                    tracing::debug!("Record for {} already exists", url);
                }

                let edges_written = self.write_edges(url, &out_links);

                Ok(UrlOutcome::Done {
                    discovered: out_links,
                    edges_written,
                })
            }
        }
    }

    /// Writes the in-boundary, non-self edges from a page
    ///
    /// Returns the number of edges inserted. Existing edges are skipped, so
    /// this is safe to repeat.
    fn write_edges(&mut self, from: &CanonicalUrl, targets: &[CanonicalUrl]) -> usize {
        let edges: Vec<LinkEdge> = targets
            .iter()
            .filter(|to| self.boundary.contains(to) && *to != from)
            .map(|to| LinkEdge::new(&self.dataset, from.clone(), to.clone()))
            .collect();

        if edges.is_empty() {
            return 0;
        }

        match self.storage.put_edges(&edges) {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Failed to write edges from {}: {}", from, e);
                self.report.edge_write_errors += 1;
                0
            }
        }
    }

    /// Counts an outcome and enqueues the links it offers
    fn settle(&mut self, url: &CanonicalUrl, outcome: UrlOutcome) {
        tracing::debug!("{} -> {}", url, outcome);
        self.report.record(&outcome);

        let follow: Vec<CanonicalUrl> = outcome
            .links_to_follow()
            .iter()
            .filter(|link| self.boundary.contains(link) && *link != url)
            .cloned()
            .collect();
        self.frontier.enqueue_all(follow);

        let processed = self.report.processed();
        if processed % PROGRESS_INTERVAL == 0 {
            let rate = processed as f64 / self.started.elapsed().as_secs_f64().max(f64::EPSILON);
            tracing::info!(
                "Progress [{}]: {} URLs processed, {} in frontier, {:.2} URLs/sec",
                self.dataset,
                processed,
                self.frontier.len(),
                rate
            );
        }
    }
}
