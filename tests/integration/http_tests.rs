//! End-to-end runs with the static HTTP renderer against a mock catalog
//!
//! These tests use wiremock to serve catalog pages and check the JSON-lines
//! file written by `run_crawl`.

use crate::support::{catalog_page, titles_for};
use listing_harvester::config::{Config, CrawlJob, JobOverrides, RendererKind};
use listing_harvester::crawler::run_crawl;
use listing_harvester::ListingRecord;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, page: u32, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/catalog/{}", page)))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

fn http_config() -> Config {
    let mut config = Config::default();
    config.browser.renderer = RendererKind::Http;
    config.crawler.settle_jitter_ms = [0, 0].into();
    config.crawler.cooldown_jitter_ms = [0, 0].into();
    config
}

fn read_records(path: &std::path::Path) -> Vec<ListingRecord> {
    std::fs::read_to_string(path)
        .expect("output file")
        .lines()
        .map(|line| serde_json::from_str(line).expect("one JSON object per line"))
        .collect()
}

#[tokio::test]
async fn test_unbounded_crawl_writes_json_lines() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 200, catalog_page(&titles_for(1, 2))).await;
    mount_page(&server, 2, 200, catalog_page(&titles_for(2, 1))).await;
    mount_page(&server, 3, 200, catalog_page(&[])).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("north.jsonl");

    let config = http_config();
    let overrides = JobOverrides {
        base_url: Some(format!("{}/catalog", server.uri())),
        output: Some(output.clone()),
        ..Default::default()
    };
    let job = CrawlJob::from_config(&config, &overrides).unwrap();

    let report = run_crawl(&config, job, CancellationToken::new())
        .await
        .expect("crawl runs");

    assert_eq!(report.pages.len(), 3);

    let records = read_records(&output);
    let titles: Vec<_> = records.iter().map(|r| r.title.clone()).collect();
    let expected: Vec<_> = titles_for(1, 2).into_iter().chain(titles_for(2, 1)).collect();
    assert_eq!(titles, expected);

    let first = &records[0];
    assert_eq!(first.price, "2,500 SAR");
    assert_eq!(first.beds.as_deref(), Some("2"));
    assert_eq!(first.area.as_deref(), Some("95"));
    assert_eq!(first.description.as_deref(), Some("وصف"));

    let raw = std::fs::read_to_string(&output).unwrap();
    assert!(raw.contains("وصف"));
    assert!(raw.contains(r#""bathrooms":"""#));
}

#[tokio::test]
async fn test_fixed_crawl_survives_server_error() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 200, catalog_page(&titles_for(1, 1))).await;
    mount_page(&server, 2, 500, "upstream error".to_string()).await;
    mount_page(&server, 3, 200, catalog_page(&titles_for(3, 1))).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("fixed.jsonl");

    let config = http_config();
    let overrides = JobOverrides {
        base_url: Some(format!("{}/catalog", server.uri())),
        pages: Some(3),
        concurrency: Some(2),
        output: Some(output.clone()),
        ..Default::default()
    };
    let job = CrawlJob::from_config(&config, &overrides).unwrap();

    let report = run_crawl(&config, job, CancellationToken::new())
        .await
        .expect("crawl runs");

    assert!(report.pages[1].is_failed());

    let titles: Vec<_> = read_records(&output).into_iter().map(|r| r.title).collect();
    assert_eq!(titles, vec!["page 1 listing 1", "page 3 listing 1"]);
}

#[tokio::test]
async fn test_missing_page_counts_as_failure_not_end() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 200, catalog_page(&titles_for(1, 1))).await;
    // Page 2 is not mounted: wiremock answers 404
    mount_page(&server, 3, 200, catalog_page(&titles_for(3, 1))).await;
    mount_page(&server, 4, 200, catalog_page(&[])).await;

    let dir = TempDir::new().unwrap();
    let config = http_config();
    let overrides = JobOverrides {
        base_url: Some(format!("{}/catalog", server.uri())),
        output: Some(dir.path().join("out.jsonl")),
        ..Default::default()
    };
    let job = CrawlJob::from_config(&config, &overrides).unwrap();

    let report = run_crawl(&config, job, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.pages.len(), 4);
    assert!(report.pages[1].is_failed());
    assert_eq!(report.records().count(), 2);
}
