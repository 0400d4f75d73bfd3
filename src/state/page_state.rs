//! Outcome definitions for fetched catalog pages
//!
//! A page either produced a (possibly empty) list of records or failed to
//! load. The two are kept apart so that a failed page is never mistaken for
//! the end of the catalog.

use crate::crawler::{FetchError, ListingRecord};
use std::fmt;

/// What happened when one page was fetched and extracted
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// The page rendered; these are its listings in document order
    Records(Vec<ListingRecord>),

    /// The page could not be rendered
    Failed(FetchError),
}

/// Coarse classification of a page outcome, used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageStatus {
    /// Rendered with at least one listing
    Harvested,
    /// Rendered with no listings: the end of the catalog
    Exhausted,
    /// Fetch or render failure
    Failed,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Harvested => "harvested",
            Self::Exhausted => "exhausted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of fetching and extracting one page index
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    /// Page index, starting at 1
    pub page: u32,

    pub outcome: PageOutcome,
}

impl PageResult {
    pub fn records(page: u32, records: Vec<ListingRecord>) -> Self {
        Self {
            page,
            outcome: PageOutcome::Records(records),
        }
    }

    pub fn failed(page: u32, error: FetchError) -> Self {
        Self {
            page,
            outcome: PageOutcome::Failed(error),
        }
    }

    /// Records of this page; a failed page has none
    pub fn listings(&self) -> &[ListingRecord] {
        match &self.outcome {
            PageOutcome::Records(records) => records,
            PageOutcome::Failed(_) => &[],
        }
    }

    /// Consumes the result, yielding its records
    pub fn into_listings(self) -> Vec<ListingRecord> {
        match self.outcome {
            PageOutcome::Records(records) => records,
            PageOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match &self.outcome {
            PageOutcome::Failed(error) => Some(error),
            PageOutcome::Records(_) => None,
        }
    }

    /// True only for a page that rendered without any listing
    pub fn is_exhausted(&self) -> bool {
        matches!(&self.outcome, PageOutcome::Records(records) if records.is_empty())
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, PageOutcome::Failed(_))
    }

    pub fn status(&self) -> PageStatus {
        match &self.outcome {
            PageOutcome::Failed(_) => PageStatus::Failed,
            PageOutcome::Records(records) if records.is_empty() => PageStatus::Exhausted,
            PageOutcome::Records(_) => PageStatus::Harvested,
        }
    }
}
