//! Pagination control
//!
//! The controller hands out page indices and decides, from each observed
//! [`PageResult`], whether the crawl continues.
//!
//! | Strategy | Stops when |
//! |----------|------------|
//! | Unbounded | a page renders with zero listings, or `max_consecutive_failures` pages fail in a row |
//! | Fixed(n) | pages `1..=n` have all been issued and observed |
//!
//! A failed page is never read as the end of the catalog.

use crate::config::PaginationStrategy;
use crate::state::{CrawlState, PageResult};

/// Shortest failure streak that may end an unbounded crawl; a single failed
/// page never does
pub const MIN_FAILURE_STREAK: u32 = 2;

/// Page-index state machine for one crawl run
#[derive(Debug, Clone)]
pub struct PaginationController {
    strategy: PaginationStrategy,
    max_consecutive_failures: u32,
    next_page: u32,
    observed: u32,
    consecutive_failures: u32,
    state: CrawlState,
}

impl PaginationController {
    /// Creates a controller starting at page 1
    ///
    /// # Arguments
    ///
    /// * `strategy` - Pagination strategy of the run
    /// * `max_consecutive_failures` - Failure streak that ends an unbounded
    ///   crawl, raised to [`MIN_FAILURE_STREAK`]; ignored by the fixed strategy
    pub fn new(strategy: PaginationStrategy, max_consecutive_failures: u32) -> Self {
        let state = match strategy {
            PaginationStrategy::Fixed(0) => CrawlState::Completed,
            _ => CrawlState::Running,
        };

        Self {
            strategy,
            max_consecutive_failures: max_consecutive_failures.max(MIN_FAILURE_STREAK),
            next_page: 1,
            observed: 0,
            consecutive_failures: 0,
            state,
        }
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Returns the next page index to issue, or `None` when no more pages
    /// should be issued
    ///
    /// For the fixed strategy every page can be issued up front; for the
    /// unbounded strategy callers observe each page before asking again.
    pub fn next_page(&mut self) -> Option<u32> {
        if !self.state.is_running() {
            return None;
        }

        if let PaginationStrategy::Fixed(n) = self.strategy {
            if self.next_page > n {
                return None;
            }
        }

        let page = self.next_page;
        self.next_page += 1;
        Some(page)
    }

    /// Feeds back the result of an issued page and returns the new state
    pub fn observe(&mut self, result: &PageResult) -> CrawlState {
        self.observed += 1;

        match self.strategy {
            PaginationStrategy::Fixed(n) => {
                if self.observed >= n {
                    self.state = CrawlState::Completed;
                }
            }
            PaginationStrategy::Unbounded => {
                if result.is_failed() {
                    self.consecutive_failures += 1;
                    if self.consecutive_failures >= self.max_consecutive_failures {
                        tracing::warn!(
                            "Stopping after {} consecutive failed pages (last: page {})",
                            self.consecutive_failures,
                            result.page
                        );
                        self.state = CrawlState::Completed;
                    }
                } else if result.is_exhausted() {
                    tracing::info!("Page {} has no listings, end of catalog", result.page);
                    self.state = CrawlState::Completed;
                } else {
                    self.consecutive_failures = 0;
                }
            }
        }

        self.state
    }
}
