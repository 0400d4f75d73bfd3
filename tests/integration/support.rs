//! Shared fixtures: catalog markup and an instrumented in-memory renderer

use async_trait::async_trait;
use listing_harvester::config::{CrawlJob, Pacing, PaginationStrategy, SelectorConfig};
use listing_harvester::crawler::{
    Coordinator, ListingExtractor, PageFetcher, PageRenderer, RenderError,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub const BASE_URL: &str = "https://catalog.test/apartments/riyadh";

/// Markup of a catalog page holding one card per title
pub fn catalog_page(titles: &[String]) -> String {
    let cards: String = titles
        .iter()
        .map(|title| {
            format!(
                r#"<div class="_listingCard__PoR_B">
                    <div class="_content__W4gas">
                        <h4>{}</h4>
                        <p class="_price__X51mi">2,500 SAR/month</p>
                        <div class="_specs__nbsgm">
                            <div class="_spec__SIJiK"><span><img alt="Bed"></span>2</div>
                            <div class="_spec__SIJiK">95 م²</div>
                        </div>
                    </div>
                    <p class="_description__zVaD6">وصف</p>
                </div>"#,
                title
            )
        })
        .collect();

    format!("<html><body><main>{}</main></body></html>", cards)
}

/// Titles of the listings placed on `page`
pub fn titles_for(page: u32, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("page {} listing {}", page, i)).collect()
}

/// In-memory renderer that records how it is called
///
/// Pages without an entry render as an empty catalog page.
#[derive(Default)]
pub struct CatalogRenderer {
    pages: HashMap<u32, Result<String, RenderError>>,
    delays: HashMap<u32, Duration>,
    default_delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    requested: Mutex<Vec<u32>>,
}

impl CatalogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(mut self, page: u32, count: usize) -> Self {
        self.pages
            .insert(page, Ok(catalog_page(&titles_for(page, count))));
        self
    }

    pub fn with_error(mut self, page: u32, error: RenderError) -> Self {
        self.pages.insert(page, Err(error));
        self
    }

    pub fn with_delay(mut self, page: u32, delay: Duration) -> Self {
        self.delays.insert(page, delay);
        self
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        let mut pages = self.requested.lock().unwrap().clone();
        pages.sort_unstable();
        pages
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageRenderer for CatalogRenderer {
    async fn render(&self, url: &Url, _settle: Duration) -> Result<String, RenderError> {
        let page: u32 = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .and_then(|segment| segment.parse().ok())
            .expect("page index in URL");

        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(page);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let delay = self.delays.get(&page).copied().unwrap_or(self.default_delay);
        tokio::time::sleep(delay).await;

        self.pages
            .get(&page)
            .cloned()
            .unwrap_or_else(|| Ok(catalog_page(&[])))
    }

    fn name(&self) -> &'static str {
        "catalog"
    }
}

/// A job with no pacing delays
pub fn job(strategy: PaginationStrategy, concurrency: usize) -> CrawlJob {
    let mut job = CrawlJob::new(Url::parse(BASE_URL).unwrap(), strategy);
    job.pacing = Pacing::none();
    job.concurrency = concurrency;
    job
}

pub fn coordinator(job: CrawlJob, renderer: Arc<CatalogRenderer>) -> Coordinator {
    let extractor = ListingExtractor::new(&SelectorConfig::default()).unwrap();
    let fetcher = PageFetcher::new(Arc::new(job), renderer, Arc::new(extractor));
    Coordinator::new(fetcher)
}
