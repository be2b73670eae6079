//! Dataset runner
//!
//! Drives one or more dataset crawls to completion over a single storage
//! connection, recording each crawl in the runs ledger.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, RetryPolicy};
use crate::crawler::pipeline::Pipeline;
use crate::crawler::registry::{DatasetRegistry, Target};
use crate::state::CrawlReport;
use crate::storage::{RunStatus, SqliteStorage, Storage};
use crate::url::{Boundary, Canonicalizer};
use crate::{ConfigError, Result};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// Crawls registered datasets one at a time
pub struct Runner {
    config: Config,
    registry: DatasetRegistry,
    storage: SqliteStorage,
    client: Client,
    canonicalizer: Canonicalizer,
    config_hash: String,
}

impl Runner {
    /// Creates a runner over an already opened storage
    ///
    /// # Arguments
    ///
    /// * `config` - Validated crawler configuration
    /// * `storage` - The connection every crawl of this process shares
    /// * `config_hash` - Hash of the configuration, recorded on each run
    pub fn new(config: Config, storage: SqliteStorage, config_hash: &str) -> Result<Self> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.fetch_timeout_secs),
        )?;

        Ok(Self {
            registry: DatasetRegistry::from_config(&config),
            canonicalizer: Canonicalizer::new(&config.crawler.canonical_scheme),
            config,
            storage,
            client,
            config_hash: config_hash.to_string(),
        })
    }

    /// Opens the configured database and creates a runner over it
    pub fn connect(config: Config, config_hash: &str) -> Result<Self> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        Self::new(config, storage, config_hash)
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Crawls every dataset of a target, sequentially
    ///
    /// An unknown dataset name fails before any network activity. With
    /// [`Target::All`] each dataset runs to completion before the next begins;
    /// the first fatal error stops the sequence.
    pub async fn run(&mut self, target: &Target) -> Result<Vec<CrawlReport>> {
        let names: Vec<String> = self
            .registry
            .resolve(target)?
            .into_iter()
            .map(|entry| entry.name.clone())
            .collect();

        let mut reports = Vec::with_capacity(names.len());
        for name in names {
            reports.push(self.crawl_dataset(&name).await?);
        }

        Ok(reports)
    }

    /// Crawls one dataset from its seed until its frontier is exhausted
    pub async fn crawl_dataset(&mut self, name: &str) -> Result<CrawlReport> {
        let entry = self.registry.get(name)?;

        let seed = self.canonicalizer.canonicalize(&entry.seed)?;
        let boundary = Boundary::from_seed(&seed, self.config.boundary.owner_segment.as_deref())?;

        if !boundary.contains(&seed) {
            return Err(ConfigError::Validation(format!(
                "seed {} of dataset {} lies outside its boundary {}",
                seed,
                name,
                boundary.root()
            ))
            .into());
        }

        self.storage.ensure_indexes()?;
        let run_id = self.storage.create_run(name, &self.config_hash)?;

        tracing::info!(
            "Starting crawl run {} of dataset {} from {} (boundary {})",
            run_id,
            name,
            seed,
            boundary.root()
        );

        let retry = RetryPolicy::new(
            self.config.crawler.max_retries,
            Duration::from_millis(self.config.crawler.retry_backoff_ms),
        );

        let (result, partial) = {
            let mut pipeline = Pipeline::new(
                name,
                boundary,
                self.canonicalizer.clone(),
                &mut self.storage,
                self.client.clone(),
            )
            .with_retry(retry)
            .with_max_in_flight(self.config.crawler.max_concurrent_fetches as usize);

            let result = pipeline.run(seed).await;
            (result, pipeline.report().clone())
        };

        self.close_run(run_id, result, partial)
    }

    /// Finishes a run in the ledger with the counters reached
    ///
    /// An aborted crawl is marked failed with its partial counters and its
    /// error is returned.
    fn close_run(
        &mut self,
        run_id: i64,
        result: Result<CrawlReport>,
        partial: CrawlReport,
    ) -> Result<CrawlReport> {
        match result {
            Ok(report) => {
                self.storage.finish_run(
                    run_id,
                    RunStatus::Completed,
                    report.fetched,
                    report.failed,
                    report.skipped,
                )?;

                tracing::info!(
                    "Crawl of {} completed in {:?}: {} fetched, {} failed, {} skipped, {} dropped, {} edges",
                    report.dataset,
                    report.elapsed,
                    report.fetched,
                    report.failed,
                    report.skipped,
                    report.dropped,
                    report.edges_written
                );

                Ok(report)
            }
            Err(e) => {
                tracing::error!(
                    "Crawl of {} aborted after {} URLs: {}",
                    partial.dataset,
                    partial.processed(),
                    e
                );
                if let Err(finish_err) = self.storage.finish_run(
                    run_id,
                    RunStatus::Failed,
                    partial.fetched,
                    partial.failed,
                    partial.skipped,
                ) {
                    tracing::error!("Failed to mark run {} as failed: {}", run_id, finish_err);
                }
                Err(e)
            }
        }
    }
}
