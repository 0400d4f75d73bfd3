//! Statistics for a finished crawl
//!
//! This module summarizes a [`CrawlReport`] and prints the summary.

use crate::crawler::CrawlReport;
use crate::state::PageStatus;
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Number of pages with a result
    pub total_pages: u64,

    /// Count of pages by status
    pub pages_by_status: HashMap<PageStatus, u64>,

    /// Number of records across all pages
    pub total_records: u64,

    /// Failed pages and their error messages, in page order
    pub failed_pages: Vec<(u32, String)>,

    /// Wall-clock duration of the run in seconds
    pub duration_seconds: i64,

    pub config_hash: Option<String>,

    pub cancelled: bool,
}

impl CrawlStatistics {
    /// Computes statistics from a crawl report
    pub fn from_report(report: &CrawlReport) -> Self {
        let mut pages_by_status = HashMap::new();
        let mut failed_pages = Vec::new();

        for page in &report.pages {
            *pages_by_status.entry(page.status()).or_insert(0) += 1;
            if let Some(error) = page.error() {
                failed_pages.push((page.page, error.to_string()));
            }
        }

        Self {
            total_pages: report.pages.len() as u64,
            pages_by_status,
            total_records: report.records().count() as u64,
            failed_pages,
            duration_seconds: (report.finished_at - report.started_at).num_seconds(),
            config_hash: report.config_hash.clone(),
            cancelled: report.cancelled,
        }
    }

    pub fn count(&self, status: PageStatus) -> u64 {
        self.pages_by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages fetched: {}", stats.total_pages);
    println!("  Records extracted: {}", stats.total_records);
    println!("  Duration: {}s", stats.duration_seconds);
    if let Some(hash) = &stats.config_hash {
        println!("  Config hash: {}", hash);
    }
    if stats.cancelled {
        println!("  Run was cancelled before completion");
    }
    println!();

    println!("Pages by Status:");
    for status in [PageStatus::Harvested, PageStatus::Exhausted, PageStatus::Failed] {
        let count = stats.count(status);
        let percentage = if stats.total_pages > 0 {
            (count as f64 / stats.total_pages as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    if !stats.failed_pages.is_empty() {
        println!("Failed Pages ({}):", stats.failed_pages.len());
        for (page, message) in &stats.failed_pages {
            println!("  - page {}: {}", page, message);
        }
        println!();
    }
}
