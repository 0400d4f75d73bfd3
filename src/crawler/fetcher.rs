//! Page fetcher
//!
//! This module fetches one catalog page end to end:
//! - Building the page URL from the job's base URL
//! - Rendering it in a fresh session, bounded by the page-load timeout
//! - Pacing: a settle delay before the DOM is read and a cooldown delay
//!   after extraction
//! - Folding any failure into a [`PageResult`] carrying a [`FetchError`]

use crate::config::CrawlJob;
use crate::crawler::extractor::ListingExtractor;
use crate::crawler::session::{PageRenderer, RenderError};
use crate::state::PageResult;
use crate::url::page_url;
use std::sync::Arc;
use thiserror::Error;

/// Why a page produced no result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("page {page}: invalid page URL: {message}")]
    InvalidUrl { page: u32, message: String },

    #[error("page {page}: {source}")]
    Render { page: u32, source: RenderError },

    #[error("page {page}: timed out after the page-load limit")]
    Timeout { page: u32 },
}

impl FetchError {
    /// Index of the page that failed
    pub fn page(&self) -> u32 {
        match self {
            Self::InvalidUrl { page, .. } | Self::Render { page, .. } | Self::Timeout { page } => {
                *page
            }
        }
    }
}

/// Fetches and extracts single catalog pages
///
/// A fetcher is shared by every worker of a crawl; each call opens its own
/// rendering session so workers never share browser state.
#[derive(Clone)]
pub struct PageFetcher {
    job: Arc<CrawlJob>,
    renderer: Arc<dyn PageRenderer>,
    extractor: Arc<ListingExtractor>,
}

impl PageFetcher {
    pub fn new(
        job: Arc<CrawlJob>,
        renderer: Arc<dyn PageRenderer>,
        extractor: Arc<ListingExtractor>,
    ) -> Self {
        Self {
            job,
            renderer,
            extractor,
        }
    }

    pub fn job(&self) -> &CrawlJob {
        &self.job
    }

    /// Fetches page `page` and extracts its listings
    ///
    /// Never fails: a render failure is logged with the page index and
    /// returned as a failed [`PageResult`], which is distinct from a page
    /// that rendered with zero listings.
    ///
    /// # Arguments
    ///
    /// * `page` - Page index, starting at 1
    pub async fn fetch_page(&self, page: u32) -> PageResult {
        let url = match page_url(&self.job.base_url, page) {
            Ok(url) => url,
            Err(e) => {
                let error = FetchError::InvalidUrl {
                    page,
                    message: e.to_string(),
                };
                tracing::warn!("Error on page {}: {}", page, error);
                return PageResult::failed(page, error);
            }
        };

        tracing::debug!("Fetching page {} via {}: {}", page, self.renderer.name(), url);

        let settle = self.job.pacing.settle.sample();
        let limit = self.job.page_load_timeout + settle;

        let markup = match tokio::time::timeout(limit, self.renderer.render(&url, settle)).await {
            Ok(Ok(markup)) => markup,
            Ok(Err(source)) => {
                let error = FetchError::Render { page, source };
                tracing::warn!("Error on page {}: {}", page, error);
                return PageResult::failed(page, error);
            }
            Err(_) => {
                let error = FetchError::Timeout { page };
                tracing::warn!("Error on page {}: {}", page, error);
                return PageResult::failed(page, error);
            }
        };

        let records = self.extractor.extract(&markup);
        tracing::debug!("Page {} yielded {} listings", page, records.len());

        tokio::time::sleep(self.job.pacing.cooldown.sample()).await;

        PageResult::records(page, records)
    }
}
