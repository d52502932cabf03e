//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Fetch and parse capabilities, with HTTP and HTML implementations
//! - The frontier queue and the per-domain crawl rules registry
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::WebCrawler;
pub use fetcher::{build_http_client, FetchResponse, Fetcher, HttpFetcher, LinkFetcher, Timed};
pub use parser::{parse_links, HtmlParser, Parser};
pub use scheduler::{DomainRegistry, Frontier, FrontierEntry};

use crate::config::CrawlerSettings;
use crate::output::CrawlReport;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl over HTTP
///
/// This is the main entry point for a one-off crawl. It will:
/// 1. Validate the settings and build the HTTP client
/// 2. Fetch each seed's robots.txt
/// 3. Fetch pages and follow links up to the depth limit
/// 4. Stop when the frontier empties, the crawl goes idle, or `cancel` fires
///
/// # Arguments
///
/// * `settings` - The crawler settings
/// * `seeds` - Seed URLs
/// * `cancel` - Cancels the crawl when triggered
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl ran to a stop
/// * `Err(CrawlerError)` - Invalid settings or seed URL
pub async fn crawl<S: AsRef<str>>(
    settings: CrawlerSettings,
    seeds: &[S],
    cancel: CancellationToken,
) -> crate::Result<CrawlReport> {
    WebCrawler::new(settings)?.crawl(seeds, cancel).await
}
