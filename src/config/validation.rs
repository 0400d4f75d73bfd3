use crate::config::job::{CrawlJob, PaginationStrategy};
use crate::crawler::MIN_FAILURE_STREAK;
use crate::config::types::{
    CatalogConfig, Config, CrawlerConfig, JitterRange, OutputConfig, SelectorConfig,
};
use crate::url::parse_catalog_url;
use crate::ConfigError;
use scraper::Selector;

const MAX_CONCURRENCY: u32 = 100;
const MIN_PAGE_LOAD_TIMEOUT_MS: u64 = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_catalog_config(&config.catalog)?;
    validate_output_config(&config.output)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

/// Validates a resolved crawl job (after CLI overrides)
pub fn validate_job(job: &CrawlJob) -> Result<(), ConfigError> {
    validate_concurrency(job.concurrency as u32)?;

    if let PaginationStrategy::Fixed(0) = job.strategy {
        return Err(ConfigError::Validation(
            "page count must be >= 1".to_string(),
        ));
    }

    validate_failure_streak(job.max_consecutive_failures)?;

    if job.output_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_concurrency(config.concurrency)?;

    if config.page_count == Some(0) {
        return Err(ConfigError::Validation(
            "page-count must be >= 1".to_string(),
        ));
    }

    validate_jitter("settle-jitter-ms", &config.settle_jitter_ms)?;
    validate_jitter("cooldown-jitter-ms", &config.cooldown_jitter_ms)?;

    if config.page_load_timeout_ms < MIN_PAGE_LOAD_TIMEOUT_MS {
        return Err(ConfigError::Validation(format!(
            "page-load-timeout-ms must be >= {}ms, got {}ms",
            MIN_PAGE_LOAD_TIMEOUT_MS, config.page_load_timeout_ms
        )));
    }

    validate_failure_streak(config.max_consecutive_failures)?;

    Ok(())
}

fn validate_failure_streak(limit: u32) -> Result<(), ConfigError> {
    if limit < MIN_FAILURE_STREAK {
        return Err(ConfigError::Validation(format!(
            "max-consecutive-failures must be >= {}, got {}",
            MIN_FAILURE_STREAK, limit
        )));
    }
    Ok(())
}

fn validate_concurrency(concurrency: u32) -> Result<(), ConfigError> {
    if !(1..=MAX_CONCURRENCY).contains(&concurrency) {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, concurrency
        )));
    }
    Ok(())
}

fn validate_jitter(name: &str, range: &JitterRange) -> Result<(), ConfigError> {
    if range.min_ms > range.max_ms {
        return Err(ConfigError::Validation(format!(
            "{} lower bound {} exceeds upper bound {}",
            name, range.min_ms, range.max_ms
        )));
    }
    Ok(())
}

/// Validates the catalog area table and the selected area
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    if config.areas.is_empty() {
        return Err(ConfigError::Validation(
            "catalog must define at least one area".to_string(),
        ));
    }

    for (name, url) in &config.areas {
        parse_catalog_url(url)
            .map_err(|e| ConfigError::InvalidUrl(format!("area '{}': {}", name, e)))?;
    }

    if !config.areas.contains_key(&config.area) {
        return Err(ConfigError::UnknownArea(config.area.clone()));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Checks that every selector parses and the markers are non-empty
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    for selector in [
        &config.listing_card,
        &config.content,
        &config.description,
        &config.title,
        &config.price,
        &config.specs,
        &config.spec,
        &config.spec_icon,
    ] {
        compile_selector(selector)?;
    }

    if config.area_unit.trim().is_empty() {
        return Err(ConfigError::Validation(
            "area-unit cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Parses a CSS selector, mapping failures to a configuration error
pub fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}
