//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the crawler's user agent string
//! - GET requests with a bounded per-request timeout
//! - Error classification into recordable failures
//! - Bounded retry with exponential backoff for transient failures

use crate::config::UserAgentConfig;
use crate::storage::TRANSPORT_FAILURE_STATUS;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// Upper bound for the connect phase of a request
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    /// A 2xx response whose body was read completely
    Fetched {
        /// Final URL after redirects; relative links resolve against it
        final_url: Url,
        /// HTTP status code
        status: u16,
        /// Page body content
        body: String,
    },

    /// Anything else: a non-2xx status, a transport error or a timeout
    Failed {
        /// HTTP status code, or 0 when no response was received
        status: u16,
        /// Error description stored with the failure record
        error: String,
        /// Whether a retry may succeed
        retryable: bool,
    },
}

impl FetchOutcome {
    fn transport(error: String, retryable: bool) -> Self {
        Self::Failed {
            status: TRANSPORT_FAILURE_STATUS,
            error,
            retryable,
        }
    }

    /// Returns true if this is a failure that may succeed on retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Failed { retryable: true, .. })
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Bound on every request, body download included
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use subtree_crawler::config::UserAgentConfig;
/// use subtree_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(15)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL)
    let user_agent = format!(
        "{}/{} (+{})",
        config.crawler_name, config.crawler_version, config.contact_url
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL once
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | 2xx, body read | `Fetched` |
/// | 4xx | `Failed`, status kept, not retryable |
/// | 5xx | `Failed`, status kept, retryable |
/// | Timeout | `Failed`, status 0, retryable |
/// | Connection error | `Failed`, status 0, retryable |
/// | Redirect loop or chain too long | `Failed`, status 0, not retryable |
/// | Body read error | `Failed`, status kept, retryable |
pub async fn fetch_url(client: &Client, url: &str) -> FetchOutcome {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return classify_transport_error(&e),
    };

    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() {
        return FetchOutcome::Failed {
            status: status.as_u16(),
            error: format!("HTTP {}", status.as_u16()),
            retryable: status.is_server_error(),
        };
    }

    match response.text().await {
        Ok(body) => FetchOutcome::Fetched {
            final_url,
            status: status.as_u16(),
            body,
        },
        Err(e) => FetchOutcome::Failed {
            status: status.as_u16(),
            error: if e.is_timeout() {
                "Request timeout".to_string()
            } else {
                format!("Failed to read body: {}", e)
            },
            retryable: true,
        },
    }
}

fn classify_transport_error(e: &reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::transport("Request timeout".to_string(), true)
    } else if e.is_connect() {
        FetchOutcome::transport(format!("Connection failed: {}", e), true)
    } else if e.is_redirect() {
        FetchOutcome::transport(format!("Redirect error: {}", e), false)
    } else {
        FetchOutcome::transport(e.to_string(), true)
    }
}

/// How often and how patiently a failed fetch is repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `attempt` (1-based), doubling each time
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Fetches a URL, repeating retryable failures as the policy allows
///
/// The outcome of the last attempt is returned.
pub async fn fetch_with_retry(client: &Client, url: &str, policy: RetryPolicy) -> FetchOutcome {
    let mut outcome = fetch_url(client, url).await;
    let mut attempt = 0;

    while outcome.is_retryable() && attempt < policy.max_retries {
        attempt += 1;
        let delay = policy.delay_for(attempt);

        if let FetchOutcome::Failed { error, .. } = &outcome {
            tracing::debug!(
                "Retrying {} in {:?} (attempt {}/{}): {}",
                url,
                delay,
                attempt,
                policy.max_retries,
                error
            );
        }

        tokio::time::sleep(delay).await;
        outcome = fetch_url(client, url).await;
    }

    outcome
}
