use crate::config::types::{
    Config, CrawlerConfig, MorphologyConfig, SearchConfig, SiteEntry, StorageConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_search_config(&config.search)?;
    validate_storage_config(&config.storage)?;
    validate_morphology_config(&config.morphology)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if let Some(workers) = config.fetch_workers {
        if !(1..=256).contains(&workers) {
            return Err(ConfigError::Validation(format!(
                "fetch-workers must be between 1 and 256, got {}",
                workers
            )));
        }
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.site_time_budget_secs < 1 {
        return Err(ConfigError::Validation(
            "site-time-budget-secs must be >= 1".to_string(),
        ));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.comfortable_batch_size > config.batch_size {
        return Err(ConfigError::Validation(format!(
            "comfortable-batch-size ({}) cannot exceed batch-size ({})",
            config.comfortable_batch_size, config.batch_size
        )));
    }

    if config.min_fetch_delay_ms > config.initial_fetch_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min-fetch-delay-ms ({}ms) cannot exceed initial-fetch-delay-ms ({}ms)",
            config.min_fetch_delay_ms, config.initial_fetch_delay_ms
        )));
    }

    Ok(())
}

/// Validates search tunables
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.word_rank_limit < 1 {
        return Err(ConfigError::Validation(
            "word-rank-limit must be >= 1".to_string(),
        ));
    }

    if config.snippet_interval < 1 {
        return Err(ConfigError::Validation(
            "snippet-interval must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates morphology configuration
///
/// Lemmas are dictionary forms, so a dictionary is mandatory.
fn validate_morphology_config(config: &MorphologyConfig) -> Result<(), ConfigError> {
    match config.dictionary_path.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => Ok(()),
        _ => Err(ConfigError::Validation(
            "[morphology] dictionary-path is required".to_string(),
        )),
    }
}

/// Validates the configured sites
fn validate_sites(sites: &[SiteEntry]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Validation(
            "At least one [[sites]] entry is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for site in sites {
        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' must have a non-empty name",
                site.url
            )));
        }

        let url = Url::parse(&site.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site URL '{}': {}", site.url, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Site URL '{}' must use http or https",
                site.url
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Site URL '{}' has no host",
                site.url
            )));
        }

        if !seen.insert(url.origin().ascii_serialization()) {
            return Err(ConfigError::Validation(format!(
                "Site '{}' is configured more than once",
                site.url
            )));
        }
    }

    Ok(())
}
