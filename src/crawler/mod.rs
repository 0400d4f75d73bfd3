//! Crawler module for catalog page fetching and listing extraction
//!
//! This module contains the core crawling logic, including:
//! - Rendering pages in disposable browser sessions
//! - Extracting listing records from rendered markup
//! - Pagination control (unbounded or fixed page count)
//! - Bounded concurrent page fetching and result ordering

mod coordinator;
mod extractor;
mod fetcher;
mod pagination;
mod scheduler;
mod session;

pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use extractor::{strip_rate_suffix, ExtractError, ListingExtractor, ListingRecord};
pub use fetcher::{FetchError, PageFetcher};
pub use pagination::{PaginationController, MIN_FAILURE_STREAK};
pub use scheduler::WorkerPool;
pub use session::{
    build_http_client, build_renderer, BrowserSession, ChromiumRenderer, HttpRenderer,
    PageRenderer, RenderError,
};
