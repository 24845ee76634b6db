use crate::config::types::{Config, CrawlConfig, FrontierConfig, ReportingConfig, WorkerConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawl_config(&config.crawl)?;
    validate_frontier_config(&config.frontier)?;
    validate_worker_config(&config.workers)?;
    validate_reporting_config(&config.reporting)?;
    Ok(())
}

/// Validates the crawl scope
fn validate_crawl_config(config: &CrawlConfig) -> ConfigResult<()> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", config.base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            config.base_url
        )));
    }

    validate_keywords("exclude_keywords", &config.exclude_keywords)?;
    validate_keywords("include_keywords", &config.include_keywords)?;

    Ok(())
}

/// Empty keywords would match every link
fn validate_keywords(field: &str, keywords: &[String]) -> ConfigResult<()> {
    if keywords.iter().any(|k| k.is_empty()) {
        return Err(ConfigError::Validation(format!(
            "{} cannot contain empty strings",
            field
        )));
    }
    Ok(())
}

/// Validates the frontier endpoint
fn validate_frontier_config(config: &FrontierConfig) -> ConfigResult<()> {
    if config.endpoint.is_empty() {
        return Err(ConfigError::Validation(
            "frontier endpoint cannot be empty".to_string(),
        ));
    }

    if config.endpoint.starts_with("http://") || config.endpoint.starts_with("https://") {
        Url::parse(&config.endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid frontier endpoint '{}': {}", config.endpoint, e))
        })?;
    }

    Ok(())
}

/// Validates worker pool limits
fn validate_worker_config(config: &WorkerConfig) -> ConfigResult<()> {
    if config.max_workers < 1 || config.max_workers > 10_000 {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and 10000, got {}",
            config.max_workers
        )));
    }

    if config.max_idle_connections < 1 {
        return Err(ConfigError::Validation(format!(
            "max_idle_connections must be >= 1, got {}",
            config.max_idle_connections
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.pool_refresh_rounds < 1 {
        return Err(ConfigError::Validation(format!(
            "pool_refresh_rounds must be >= 1, got {}",
            config.pool_refresh_rounds
        )));
    }

    Ok(())
}

/// Validates reporting intervals
fn validate_reporting_config(config: &ReportingConfig) -> ConfigResult<()> {
    // backup_interval_secs == 0 disables backups, so only the stats interval is bounded
    if config.stats_interval_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "stats_interval_secs must be >= 1, got {}",
            config.stats_interval_secs
        )));
    }

    Ok(())
}
