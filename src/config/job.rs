//! Resolved, read-only description of one crawl run

use crate::config::types::{Config, JitterRange, RendererKind, StrategyKind};
use crate::config::validation::validate_job;
use crate::url::parse_catalog_url;
use crate::ConfigError;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Pagination strategy of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStrategy {
    /// Crawl pages 1, 2, ... until one comes back without listings
    Unbounded,
    /// Crawl exactly pages `1..=n`
    Fixed(u32),
}

/// Politeness delays applied around every page render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Sleep after page load, before the DOM is read
    pub settle: JitterRange,
    /// Sleep after extraction, before the fetch returns
    pub cooldown: JitterRange,
}

impl Pacing {
    /// No delays at all; useful for tests and local fixtures
    pub const fn none() -> Self {
        Self {
            settle: JitterRange::zero(),
            cooldown: JitterRange::zero(),
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            settle: JitterRange::new(0, 4000),
            cooldown: JitterRange::new(0, 6000),
        }
    }
}

/// Command-line overrides applied on top of the file configuration
#[derive(Debug, Clone, Default)]
pub struct JobOverrides {
    pub area: Option<String>,
    pub base_url: Option<String>,
    pub pages: Option<u32>,
    pub concurrency: Option<u32>,
    pub output: Option<PathBuf>,
    pub renderer: Option<RendererKind>,
}

/// Configuration of one crawl run
///
/// Built once before the crawl starts and shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct CrawlJob {
    /// Base catalog URL; page `n` lives at `{base_url}/{n}`
    pub base_url: Url,
    /// Name of the catalog area, if the URL came from the area table
    pub area: Option<String>,
    pub output_path: PathBuf,
    /// Worker pool size for the fixed strategy
    pub concurrency: usize,
    pub strategy: PaginationStrategy,
    pub pacing: Pacing,
    pub page_load_timeout: Duration,
    pub max_consecutive_failures: u32,
    pub renderer: RendererKind,
}

impl CrawlJob {
    /// Creates a job with default limits for the given catalog and strategy
    pub fn new(base_url: Url, strategy: PaginationStrategy) -> Self {
        Self {
            base_url,
            area: None,
            output_path: PathBuf::from("listings.jsonl"),
            concurrency: 5,
            strategy,
            pacing: Pacing::default(),
            page_load_timeout: Duration::from_secs(30),
            max_consecutive_failures: 3,
            renderer: RendererKind::default(),
        }
    }

    /// Resolves a job from the file configuration and CLI overrides
    ///
    /// Overrides win over the file. `--pages` implies the fixed strategy and
    /// an explicit base URL replaces the area lookup.
    ///
    /// # Arguments
    ///
    /// * `config` - The loaded configuration
    /// * `overrides` - Values given on the command line
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlJob)` - A validated job
    /// * `Err(ConfigError)` - Unknown area, bad URL, or limits out of range
    pub fn from_config(config: &Config, overrides: &JobOverrides) -> Result<Self, ConfigError> {
        let (area, raw_url) = match &overrides.base_url {
            Some(url) => (None, url.clone()),
            None => {
                let area = overrides
                    .area
                    .clone()
                    .unwrap_or_else(|| config.catalog.area.clone());
                let url = config
                    .catalog
                    .areas
                    .get(&area)
                    .cloned()
                    .ok_or_else(|| ConfigError::UnknownArea(area.clone()))?;
                (Some(area), url)
            }
        };

        let base_url = parse_catalog_url(&raw_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", raw_url, e)))?;

        let strategy = match (overrides.pages, config.crawler.strategy) {
            (Some(pages), _) => PaginationStrategy::Fixed(pages),
            (None, StrategyKind::Fixed) => {
                let pages = config.crawler.page_count.ok_or_else(|| {
                    ConfigError::Validation(
                        "page-count is required when strategy = \"fixed\"".to_string(),
                    )
                })?;
                PaginationStrategy::Fixed(pages)
            }
            (None, StrategyKind::Unbounded) => PaginationStrategy::Unbounded,
        };

        let output_path = overrides
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.output.path));

        let job = Self {
            base_url,
            area,
            output_path,
            concurrency: overrides.concurrency.unwrap_or(config.crawler.concurrency) as usize,
            strategy,
            pacing: Pacing {
                settle: config.crawler.settle_jitter_ms,
                cooldown: config.crawler.cooldown_jitter_ms,
            },
            page_load_timeout: Duration::from_millis(config.crawler.page_load_timeout_ms),
            max_consecutive_failures: config.crawler.max_consecutive_failures,
            renderer: overrides.renderer.unwrap_or(config.browser.renderer),
        };

        validate_job(&job)?;
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve_to_north_riyadh() {
        let job = CrawlJob::from_config(&Config::default(), &JobOverrides::default()).unwrap();

        assert_eq!(job.area.as_deref(), Some("north-riyadh"));
        assert_eq!(job.strategy, PaginationStrategy::Unbounded);
        assert_eq!(job.concurrency, 5);
        assert_eq!(job.pacing, Pacing::default());
        assert_eq!(job.output_path, PathBuf::from("listings.jsonl"));
    }

    #[test]
    fn test_pages_override_selects_fixed_strategy() {
        let overrides = JobOverrides {
            area: Some("east-riyadh".to_string()),
            pages: Some(4),
            concurrency: Some(2),
            ..Default::default()
        };
        let job = CrawlJob::from_config(&Config::default(), &overrides).unwrap();

        assert_eq!(job.area.as_deref(), Some("east-riyadh"));
        assert_eq!(job.strategy, PaginationStrategy::Fixed(4));
        assert_eq!(job.concurrency, 2);
    }

    #[test]
    fn test_unknown_area() {
        let overrides = JobOverrides {
            area: Some("jeddah".to_string()),
            ..Default::default()
        };
        let result = CrawlJob::from_config(&Config::default(), &overrides);
        assert!(matches!(result, Err(ConfigError::UnknownArea(a)) if a == "jeddah"));
    }

    #[test]
    fn test_fixed_strategy_requires_page_count() {
        let mut config = Config::default();
        config.crawler.strategy = StrategyKind::Fixed;

        let result = CrawlJob::from_config(&config, &JobOverrides::default());
        assert!(matches!(result, Err(ConfigError::Validation(_))));

        config.crawler.page_count = Some(7);
        let job = CrawlJob::from_config(&config, &JobOverrides::default()).unwrap();
        assert_eq!(job.strategy, PaginationStrategy::Fixed(7));
    }

    #[test]
    fn test_base_url_override_skips_area_lookup() {
        let overrides = JobOverrides {
            area: Some("does-not-exist".to_string()),
            base_url: Some("http://127.0.0.1:9000/catalog".to_string()),
            ..Default::default()
        };
        let job = CrawlJob::from_config(&Config::default(), &overrides).unwrap();

        assert_eq!(job.area, None);
        assert_eq!(job.base_url.as_str(), "http://127.0.0.1:9000/catalog");
    }

    #[test]
    fn test_zero_pages_rejected() {
        let overrides = JobOverrides {
            pages: Some(0),
            ..Default::default()
        };
        assert!(CrawlJob::from_config(&Config::default(), &overrides).is_err());
    }
}
