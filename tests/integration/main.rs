//! Integration tests for the crawler

mod crawl_tests;
mod http_tests;
mod support;
