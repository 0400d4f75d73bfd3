//! Crawler coordinator - main crawl orchestration logic
//!
//! This module drives a crawl run:
//! - Issuing page indices from the pagination controller
//! - Fetching sequentially (unbounded) or over the worker pool (fixed)
//! - Reassembling page results in page-index order
//! - Handing the aggregated records to the output sink

use crate::config::{Config, CrawlJob, PaginationStrategy};
use crate::crawler::extractor::{ListingExtractor, ListingRecord};
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::pagination::PaginationController;
use crate::crawler::scheduler::WorkerPool;
use crate::crawler::session::build_renderer;
use crate::output::{CrawlStatistics, JsonLinesSink, RecordSink};
use crate::state::PageResult;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a crawl run produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Page results ordered by page index
    pub pages: Vec<PageResult>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Hash of the configuration file, when one was used
    pub config_hash: Option<String>,

    /// True if the run was cut short by the cancellation hook
    pub cancelled: bool,
}

impl CrawlReport {
    /// All records, page by page, in page-index order
    pub fn records(&self) -> impl Iterator<Item = &ListingRecord> {
        self.pages.iter().flat_map(|page| page.listings())
    }

    pub fn into_records(self) -> Vec<ListingRecord> {
        self.pages
            .into_iter()
            .flat_map(PageResult::into_listings)
            .collect()
    }

    pub fn statistics(&self) -> CrawlStatistics {
        CrawlStatistics::from_report(self)
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    fetcher: PageFetcher,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator around a page fetcher
    pub fn new(fetcher: PageFetcher) -> Self {
        Self {
            fetcher,
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the cancellation token, e.g. with one wired to Ctrl-C
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the crawl when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the crawl to completion (or cancellation)
    ///
    /// Page failures never abort the run; they show up as failed pages in
    /// the report and contribute no records.
    pub async fn run(&self) -> CrawlReport {
        let job = self.fetcher.job();
        let started_at = Utc::now();

        tracing::info!(
            "Starting crawl of {} ({:?}, {} workers)",
            job.base_url,
            job.strategy,
            job.concurrency
        );

        let controller = PaginationController::new(job.strategy, job.max_consecutive_failures);
        let pages = match job.strategy {
            PaginationStrategy::Unbounded => self.run_sequential(controller).await,
            PaginationStrategy::Fixed(_) => self.run_pooled(controller).await,
        };

        let report = CrawlReport {
            pages,
            started_at,
            finished_at: Utc::now(),
            config_hash: None,
            cancelled: self.cancel.is_cancelled(),
        };

        tracing::info!(
            "Crawl finished: {} pages, {} records in {}s{}",
            report.pages.len(),
            report.records().count(),
            (report.finished_at - report.started_at).num_seconds(),
            if report.cancelled { " (cancelled)" } else { "" }
        );

        report
    }

    /// Unbounded strategy: one page at a time, each result decides whether
    /// the next page is needed
    async fn run_sequential(&self, mut controller: PaginationController) -> Vec<PageResult> {
        let mut pages = Vec::new();

        while let Some(page) = controller.next_page() {
            let result = tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("Crawl cancelled before page {} completed", page);
                    break;
                }
                result = self.fetcher.fetch_page(page) => result,
            };

            controller.observe(&result);
            pages.push(result);
            report_progress(pages.len(), &pages);
        }

        pages
    }

    /// Fixed strategy: all pages submitted to the pool, collected by index
    async fn run_pooled(&self, mut controller: PaginationController) -> Vec<PageResult> {
        let mut pool = WorkerPool::new(self.fetcher.job().concurrency);

        while let Some(page) = controller.next_page() {
            pool.submit(page, self.fetcher.clone(), self.cancel.clone());
        }
        tracing::debug!("Submitted {} pages to {} workers", pool.pending(), pool.size());

        let mut collected = BTreeMap::new();
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(Some(result)) => {
                    controller.observe(&result);
                    collected.insert(result.page, result);
                    if collected.len() % 10 == 0 {
                        tracing::info!(
                            "Progress: {} pages done, {} pending",
                            collected.len(),
                            pool.pending()
                        );
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::error!("Page worker failed: {}", e),
            }
        }

        collected.into_values().collect()
    }
}

fn report_progress(done: usize, pages: &[PageResult]) {
    if done % 10 == 0 {
        let records: usize = pages.iter().map(|p| p.listings().len()).sum();
        tracing::info!("Progress: {} pages crawled, {} records", done, records);
    }
}

/// Runs a complete crawl and writes the records to the job's output file
///
/// This function orchestrates the entire run:
///
/// 1. Compile the listing selectors
/// 2. Build the renderer selected by the job
/// 3. Create the output file (before any page is fetched)
/// 4. Crawl with the job's pagination strategy
/// 5. Write the aggregated records, one JSON object per line
///
/// # Arguments
///
/// * `config` - The loaded configuration (selectors and browser settings)
/// * `job` - The resolved crawl job
/// * `cancel` - Cancellation hook; cancelling keeps what was collected
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl ran and its records were written
/// * `Err(HarvestError)` - Startup or output failure
///
/// # Example
///
/// ```no_run
/// use listing_harvester::config::{Config, CrawlJob, JobOverrides};
/// use listing_harvester::crawler::run_crawl;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let job = CrawlJob::from_config(&config, &JobOverrides::default())?;
/// let report = run_crawl(&config, job, CancellationToken::new()).await?;
/// println!("{} records", report.records().count());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    job: CrawlJob,
    cancel: CancellationToken,
) -> crate::Result<CrawlReport> {
    let extractor = Arc::new(ListingExtractor::new(&config.selectors)?);
    let renderer = build_renderer(&job, &config.browser)?;
    let mut sink = JsonLinesSink::create(&job.output_path)?;
    let output_path = job.output_path.clone();

    let fetcher = PageFetcher::new(Arc::new(job), renderer, extractor);
    let coordinator = Coordinator::new(fetcher).with_cancellation(cancel);
    let report = coordinator.run().await;

    let written = sink.write_all(report.records())?;
    sink.finish()?;
    tracing::info!("Wrote {} records to {}", written, output_path.display());

    Ok(report)
}
