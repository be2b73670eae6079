use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub boundary: BoundaryConfig,
    /// Dataset registry; empty means the built-in registry
    #[serde(rename = "dataset", default)]
    pub datasets: Vec<DatasetEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Per-request timeout in seconds
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// Maximum number of fetches in flight at once
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,

    /// Retries after a transport error, timeout or 5xx response
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay before the first retry, doubled for each further retry (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Scheme every canonical URL is forced to
    #[serde(rename = "canonical-scheme")]
    pub canonical_scheme: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 15,
            max_concurrent_fetches: 4,
            max_retries: 0,
            retry_backoff_ms: 500,
            canonical_scheme: crate::url::DEFAULT_SCHEME.to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "subtree-crawler".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.org/subtree-crawler".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./crawl.db".to_string(),
        }
    }
}

/// Boundary policy configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Owner subtree path segment (e.g. "~owner"); defaults to the seed's
    /// first path segment
    #[serde(rename = "owner-segment")]
    pub owner_segment: Option<String>,
}

/// A named dataset and the seed page its crawl starts from
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatasetEntry {
    pub name: String,
    pub seed: String,
}

impl DatasetEntry {
    pub fn new(name: &str, seed: &str) -> Self {
        Self {
            name: name.to_string(),
            seed: seed.to_string(),
        }
    }
}
