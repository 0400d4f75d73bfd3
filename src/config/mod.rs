//! Configuration module for Listing Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and resolving them (plus command-line overrides) into a [`CrawlJob`].
//!
//! # Example
//!
//! ```no_run
//! use listing_harvester::config::{load_config, CrawlJob, JobOverrides};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! let job = CrawlJob::from_config(&config, &JobOverrides::default()).unwrap();
//! println!("Crawling {} with {} workers", job.base_url, job.concurrency);
//! ```

mod job;
mod parser;
mod types;
mod validation;

// Re-export types
pub use job::{CrawlJob, JobOverrides, Pacing, PaginationStrategy};
pub use types::{
    CatalogConfig, Config, CrawlerConfig, JitterRange, OutputConfig, RendererConfig,
    RendererKind, SelectorConfig, StrategyKind,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{compile_selector, validate};
