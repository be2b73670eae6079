use crate::config::types::{BoundaryConfig, Config, CrawlerConfig, DatasetEntry, UserAgentConfig};
use crate::crawler::ALL_TARGET;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_boundary_config(&config.boundary)?;
    validate_datasets(&config.datasets)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.fetch_timeout_secs < 1 || config.fetch_timeout_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_secs must be between 1 and 120, got {}",
            config.fetch_timeout_secs
        )));
    }

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 64, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.max_retries > 0 && config.retry_backoff_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "retry_backoff_ms must be >= 10ms when retries are enabled, got {}ms",
            config.retry_backoff_ms
        )));
    }

    if config.canonical_scheme != "http" && config.canonical_scheme != "https" {
        return Err(ConfigError::Validation(format!(
            "canonical_scheme must be 'http' or 'https', got '{}'",
            config.canonical_scheme
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_boundary_config(config: &BoundaryConfig) -> Result<(), ConfigError> {
    if let Some(segment) = &config.owner_segment {
        let trimmed = segment.trim_matches('/');
        if trimmed.is_empty() {
            return Err(ConfigError::Validation(
                "owner_segment cannot be empty".to_string(),
            ));
        }
        if trimmed.chars().any(|c| c.is_whitespace() || c == '?' || c == '#') {
            return Err(ConfigError::Validation(format!(
                "owner_segment must be a plain path segment, got '{}'",
                segment
            )));
        }
    }

    Ok(())
}

/// Validates dataset registry entries
fn validate_datasets(datasets: &[DatasetEntry]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for entry in datasets {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Dataset name cannot be empty".to_string(),
            ));
        }

        if entry.name == ALL_TARGET {
            return Err(ConfigError::Validation(format!(
                "Dataset name '{}' is reserved",
                ALL_TARGET
            )));
        }

        if !names.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Dataset '{}' is defined more than once",
                entry.name
            )));
        }

        let url = Url::parse(&entry.seed).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", entry.seed, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use http or https",
                entry.seed
            )));
        }
    }

    Ok(())
}
