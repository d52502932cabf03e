//! HTTP fetcher implementation
//!
//! This module defines the fetch capabilities the crawler depends on and the
//! reqwest-backed implementation used outside of tests:
//! - Building HTTP clients with the configured user agent and timeout
//! - Raw GET requests (used for robots.txt)
//! - GET + link extraction (used for pages)
//! - Error classification (timeout vs other transport failures)

use crate::config::CrawlerSettings;
use crate::crawler::parser::Parser;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Upper bound on the TCP connect phase of a request
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a timed fetch: elapsed time plus the result
pub type Timed<T> = (Duration, Result<T, FetchError>);

/// A fetched HTTP response, fully read
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub url: Url,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Response body
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true if the response declares HTML content, or declares nothing
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map_or(true, |ct| ct.to_ascii_lowercase().contains("html"))
    }
}

/// Raw content download
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Makes a GET request, returning the elapsed time and the response or error
    async fn fetch(&self, url: &Url) -> Timed<FetchResponse>;
}

/// Content download followed by link extraction
#[async_trait]
pub trait LinkFetcher: Fetcher {
    /// Makes a GET request, parses the page and returns the absolute URLs it links to
    async fn fetch_links(&self, url: &Url) -> Timed<Vec<Url>>;
}

/// Builds an HTTP client from the crawler settings
///
/// # Example
///
/// ```no_run
/// use polite_crawler::config::CrawlerSettings;
/// use polite_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerSettings::new("ExampleBot/1.0")).unwrap();
/// ```
pub fn build_http_client(settings: &CrawlerSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(settings.fetch_timeout)
        .connect_timeout(settings.fetch_timeout.min(MAX_CONNECT_TIMEOUT))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed fetch capability
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    parser: Arc<dyn Parser>,
}

impl HttpFetcher {
    /// Creates a fetcher using the settings' user agent, timeout and parser
    pub fn new(settings: &CrawlerSettings) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(settings)?,
            parser: Arc::clone(&settings.parser),
        })
    }

    /// Creates a fetcher around an already configured client
    pub fn with_client(client: Client, parser: Arc<dyn Parser>) -> Self {
        Self { client, parser }
    }

    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        Ok(FetchResponse {
            url: final_url,
            status,
            content_type,
            body,
        })
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Timed<FetchResponse> {
        let start = Instant::now();
        let result = self.get(url).await;
        (start.elapsed(), result)
    }
}

#[async_trait]
impl LinkFetcher for HttpFetcher {
    async fn fetch_links(&self, url: &Url) -> Timed<Vec<Url>> {
        let (elapsed, result) = self.fetch(url).await;
        let response = match result {
            Ok(response) => response,
            Err(e) => return (elapsed, Err(e)),
        };

        if !response.is_success() {
            return (
                elapsed,
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: response.status,
                }),
            );
        }

        if !response.is_html() {
            tracing::debug!(
                "Not parsing {} ({})",
                url,
                response.content_type.as_deref().unwrap_or("unknown type")
            );
            return (elapsed, Ok(Vec::new()));
        }

        let links = self
            .parser
            .parse(&response.url, &response.body)
            .map_err(|message| FetchError::Parse {
                url: url.to_string(),
                message,
            });
        (elapsed, links)
    }
}
