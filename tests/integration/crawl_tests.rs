//! Crawl orchestration tests against an instrumented in-memory renderer

use crate::support::{coordinator, job, titles_for, CatalogRenderer};
use listing_harvester::config::PaginationStrategy;
use listing_harvester::crawler::{FetchError, RenderError};
use listing_harvester::state::PageStatus;
use std::sync::Arc;
use std::time::Duration;

fn titles(report: &listing_harvester::crawler::CrawlReport) -> Vec<String> {
    report.records().map(|r| r.title.clone()).collect()
}

#[tokio::test]
async fn test_fixed_count_preserves_page_order() {
    // Page 1 finishes last, page 3 first
    let renderer = Arc::new(
        CatalogRenderer::new()
            .with_listings(1, 2)
            .with_listings(2, 2)
            .with_listings(3, 2)
            .with_delay(1, Duration::from_millis(120))
            .with_delay(2, Duration::from_millis(60)),
    );

    let report = coordinator(job(PaginationStrategy::Fixed(3), 3), renderer.clone())
        .run()
        .await;

    assert_eq!(renderer.calls(), 3);
    assert_eq!(renderer.requested_pages(), vec![1, 2, 3]);

    let expected: Vec<String> = (1..=3).flat_map(|page| titles_for(page, 2)).collect();
    assert_eq!(titles(&report), expected);

    let pages: Vec<u32> = report.pages.iter().map(|p| p.page).collect();
    assert_eq!(pages, vec![1, 2, 3]);
    assert!(!report.cancelled);
}

#[tokio::test]
async fn test_fixed_count_ignores_empty_pages() {
    let renderer = Arc::new(CatalogRenderer::new().with_listings(1, 1).with_listings(4, 1));

    let report = coordinator(job(PaginationStrategy::Fixed(4), 2), renderer.clone())
        .run()
        .await;

    assert_eq!(renderer.calls(), 4);
    assert_eq!(titles(&report), vec!["page 1 listing 1", "page 4 listing 1"]);
    assert_eq!(report.statistics().count(PageStatus::Exhausted), 2);
}

#[tokio::test]
async fn test_worker_pool_bounds_in_flight_fetches() {
    let mut renderer = CatalogRenderer::new().with_default_delay(Duration::from_millis(25));
    for page in 1..=12 {
        renderer = renderer.with_listings(page, 1);
    }
    let renderer = Arc::new(renderer);

    let report = coordinator(job(PaginationStrategy::Fixed(12), 3), renderer.clone())
        .run()
        .await;

    assert_eq!(renderer.calls(), 12);
    assert!(renderer.peak_in_flight() <= 3, "peak was {}", renderer.peak_in_flight());
    assert!(renderer.peak_in_flight() >= 1);
    assert_eq!(report.records().count(), 12);
}

#[tokio::test]
async fn test_single_worker_is_sequential() {
    let mut renderer = CatalogRenderer::new().with_default_delay(Duration::from_millis(10));
    for page in 1..=4 {
        renderer = renderer.with_listings(page, 1);
    }
    let renderer = Arc::new(renderer);

    coordinator(job(PaginationStrategy::Fixed(4), 1), renderer.clone())
        .run()
        .await;

    assert_eq!(renderer.peak_in_flight(), 1);
}

#[tokio::test]
async fn test_failed_page_does_not_abort_fixed_crawl() {
    let renderer = Arc::new(
        CatalogRenderer::new()
            .with_listings(1, 2)
            .with_error(2, RenderError::Status(503))
            .with_listings(3, 1),
    );

    let report = coordinator(job(PaginationStrategy::Fixed(3), 3), renderer.clone())
        .run()
        .await;

    assert_eq!(renderer.calls(), 3);
    assert_eq!(report.pages.len(), 3);
    assert!(report.pages[1].is_failed());
    assert!(matches!(
        report.pages[1].error(),
        Some(FetchError::Render { page: 2, .. })
    ));

    let expected: Vec<String> = titles_for(1, 2).into_iter().chain(titles_for(3, 1)).collect();
    assert_eq!(titles(&report), expected);

    let stats = report.statistics();
    assert_eq!(stats.failed_pages.len(), 1);
    assert_eq!(stats.failed_pages[0].0, 2);
}

#[tokio::test]
async fn test_unbounded_stops_after_first_empty_page() {
    let renderer = Arc::new(
        CatalogRenderer::new()
            .with_listings(1, 3)
            .with_listings(2, 1)
            .with_listings(4, 5),
    );

    let report = coordinator(job(PaginationStrategy::Unbounded, 5), renderer.clone())
        .run()
        .await;

    // Page 3 is empty, so page 4 is never requested
    assert_eq!(renderer.requested_pages(), vec![1, 2, 3]);
    assert_eq!(report.pages.len(), 3);
    assert!(report.pages[2].is_exhausted());
    assert_eq!(report.records().count(), 4);
    assert_eq!(renderer.peak_in_flight(), 1);
}

#[tokio::test]
async fn test_unbounded_continues_past_failed_page() {
    let renderer = Arc::new(
        CatalogRenderer::new()
            .with_listings(1, 1)
            .with_error(
                2,
                RenderError::Navigation {
                    url: "https://catalog.test/apartments/riyadh/2".to_string(),
                    message: "net::ERR_CONNECTION_RESET".to_string(),
                },
            )
            .with_listings(3, 1),
    );

    let report = coordinator(job(PaginationStrategy::Unbounded, 5), renderer.clone())
        .run()
        .await;

    assert_eq!(renderer.requested_pages(), vec![1, 2, 3, 4]);
    assert_eq!(
        titles(&report),
        vec!["page 1 listing 1", "page 3 listing 1"]
    );
    assert!(report.pages[1].is_failed());
    assert!(report.pages[3].is_exhausted());
}

#[tokio::test]
async fn test_unbounded_gives_up_on_failure_streak() {
    let mut renderer = CatalogRenderer::new().with_listings(1, 1);
    for page in 2..=10 {
        renderer = renderer.with_error(page, RenderError::Timeout);
    }
    let renderer = Arc::new(renderer);

    let mut crawl_job = job(PaginationStrategy::Unbounded, 1);
    crawl_job.max_consecutive_failures = 3;

    let report = coordinator(crawl_job, renderer.clone()).run().await;

    assert_eq!(renderer.requested_pages(), vec![1, 2, 3, 4]);
    assert_eq!(report.records().count(), 1);
    assert_eq!(report.statistics().count(PageStatus::Failed), 3);
}

#[tokio::test]
async fn test_cancellation_keeps_collected_pages() {
    let mut renderer = CatalogRenderer::new()
        .with_default_delay(Duration::from_millis(400))
        .with_delay(1, Duration::ZERO);
    for page in 1..=10 {
        renderer = renderer.with_listings(page, 1);
    }
    let renderer = Arc::new(renderer);

    let coordinator = coordinator(job(PaginationStrategy::Fixed(10), 2), renderer.clone());
    let cancel = coordinator.cancellation_token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let report = coordinator.run().await;

    assert!(report.cancelled);
    assert!(report.pages.len() < 10);
    assert_eq!(report.pages[0].page, 1);
    assert!(renderer.calls() < 10);
}
