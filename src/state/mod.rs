//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageResult` / `PageOutcome`: what a single page fetch produced
//! - `PageStatus`: harvested, exhausted, or failed, for reporting
//! - `CrawlState`: whether a pagination run is still going

mod crawl_state;
mod page_state;

// Re-export main types
pub use crawl_state::CrawlState;
pub use page_state::{PageOutcome, PageResult, PageStatus};
