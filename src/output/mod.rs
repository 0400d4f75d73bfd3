//! Output module for crawl results
//!
//! This module handles:
//! - Writing extracted records as JSON lines for the downstream cleaner
//! - Summarizing and printing crawl statistics

mod jsonl;
pub mod stats;
mod traits;

pub use jsonl::JsonLinesSink;
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputResult, RecordSink, VecSink};
