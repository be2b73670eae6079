//! Subtree Crawler main entry point
//!
//! This is the command-line interface for the subtree crawler.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use subtree_crawler::config::{default_config_with_hash, load_config_with_hash, Config};
use subtree_crawler::crawler::{DatasetRegistry, Runner, Target};
use subtree_crawler::output::{load_statistics, print_report, print_statistics};
use subtree_crawler::storage::SqliteStorage;
use subtree_crawler::url::{Boundary, Canonicalizer};
use tracing_subscriber::EnvFilter;

/// Subtree Crawler: a scoped link-graph crawler
///
/// Crawls the owner subtree of a dataset's seed page, storing every page and
/// the links between pages. Reruns skip pages that are already complete and
/// retry pages that failed.
#[derive(Parser, Debug)]
#[command(name = "subtree-crawler")]
#[command(version)]
#[command(about = "A scoped link-graph crawler", long_about = None)]
struct Cli {
    /// Dataset to crawl (tinyfruits, fruits100, fruitsA, fruitgraph) or "all"
    #[arg(value_name = "TARGET", required_unless_present = "list")]
    target: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// List the registered datasets and their boundaries and exit
    #[arg(long, conflicts_with = "stats")]
    list: bool,

    /// Show statistics for the target from the database and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, hash)
        }
        None => default_config_with_hash(),
    };

    if cli.list {
        return handle_list(&config);
    }

    let target = Target::parse(cli.target.as_deref().unwrap_or_default());

    if cli.stats {
        handle_stats(&config, &target)
    } else {
        handle_crawl(config, &config_hash, &target).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("subtree_crawler=info,warn"),
            1 => EnvFilter::new("subtree_crawler=debug,info"),
            2 => EnvFilter::new("subtree_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --list: prints each dataset with its seed and boundary root
fn handle_list(config: &Config) -> anyhow::Result<()> {
    let registry = DatasetRegistry::from_config(config);
    let canonicalizer = Canonicalizer::new(&config.crawler.canonical_scheme);

    println!("=== Datasets ({}) ===\n", registry.len());
    for entry in registry.iter() {
        let seed = canonicalizer
            .canonicalize(&entry.seed)
            .with_context(|| format!("invalid seed for dataset {}", entry.name))?;
        let boundary = Boundary::from_seed(&seed, config.boundary.owner_segment.as_deref())?;

        println!("  {}", entry.name);
        println!("    seed:     {}", seed);
        println!("    boundary: {}", boundary.root());
    }

    Ok(())
}

/// Handles --stats: shows persisted statistics of the target's datasets
fn handle_stats(config: &Config, target: &Target) -> anyhow::Result<()> {
    let registry = DatasetRegistry::from_config(config);
    let datasets = registry.resolve(target)?;

    println!("Database: {}\n", config.output.database_path);
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    for entry in datasets {
        let stats = load_statistics(&storage, &entry.name)
            .with_context(|| format!("failed to load statistics for {}", entry.name))?;
        print_statistics(&stats);
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str, target: &Target) -> anyhow::Result<()> {
    let mut runner = Runner::connect(config, config_hash)?;

    // Resolve before touching the network so an unknown name fails fast
    let datasets = runner.registry().resolve(target)?.len();
    tracing::info!("Crawling {} dataset(s)", datasets);

    match runner.run(target).await {
        Ok(reports) => {
            for report in &reports {
                print_report(report);
            }
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
