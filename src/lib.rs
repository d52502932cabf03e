//! Polite Crawler: a depth-bounded, robots-aware web crawler
//!
//! This crate discovers and fetches pages within a domain starting from one or
//! more seed URLs. It respects robots.txt directives, paces requests per domain
//! with an adaptive politeness delay, and stops after a depth limit, an idle
//! timeout, or an external cancellation.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Per-URL fetch failures
///
/// None of these abort a crawl: the frontier entry that produced one is
/// abandoned and reported, and the crawl moves on.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Failed to parse {url}: {message}")]
    Parse { url: String, message: String },
}

impl FetchError {
    /// Returns true if the fetch gave up because the fetch timeout elapsed
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if the server answered, even with an error status
    pub fn has_response(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Body { .. } | Self::Parse { .. })
    }

    /// The URL the failed request was made for
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Status { url, .. }
            | Self::Transport { url, .. }
            | Self::Body { url, .. }
            | Self::Parse { url, .. } => url,
        }
    }
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlerSettings};
pub use crawler::{HtmlParser, HttpFetcher, WebCrawler};
pub use output::{CrawlEvent, CrawlReport, FailedFetch, ParsedResult, StopReason};
pub use state::{CrawlingRules, MemoryCache, VisitedCache};
