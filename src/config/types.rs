use crate::crawler::{HtmlParser, Parser};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default fetch timeout before giving up on a URL
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Default idle time after the last successful fetch before the crawl stops
pub const DEFAULT_CRAWL_TIMEOUT_MS: u64 = 30_000;

/// Default fixed politeness delay used to compute the randomized wait
pub const DEFAULT_POLITENESS_DELAY_MS: u64 = 500;

/// Default depth limit
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Default number of concurrent fetches
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Default user agent
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

/// Main configuration structure, as read from a TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Time to wait for a single fetch (milliseconds)
    #[serde(rename = "fetch-timeout-ms", default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Idle time without a successful fetch before stopping (milliseconds)
    #[serde(rename = "crawl-timeout-ms", default = "default_crawl_timeout_ms")]
    pub crawl_timeout_ms: u64,

    /// Maximum number of concurrent fetches, 0 means unbounded
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Maximum depth to crawl from the seeds, 0 means unlimited
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: usize,

    /// User agent sent with every request and matched against robots.txt
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Fixed politeness delay between requests to the same domain (milliseconds)
    #[serde(rename = "politeness-delay-ms", default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            crawl_timeout_ms: DEFAULT_CRAWL_TIMEOUT_MS,
            concurrency: DEFAULT_CONCURRENCY,
            max_depth: DEFAULT_MAX_DEPTH,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            politeness_delay_ms: DEFAULT_POLITENESS_DELAY_MS,
        }
    }
}

fn default_fetch_timeout_ms() -> u64 {
    DEFAULT_FETCH_TIMEOUT_MS
}

fn default_crawl_timeout_ms() -> u64 {
    DEFAULT_CRAWL_TIMEOUT_MS
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_politeness_delay_ms() -> u64 {
    DEFAULT_POLITENESS_DELAY_MS
}

/// Immutable settings snapshot for one crawl
///
/// Built once per crawl invocation, either from defaults, from a loaded
/// [`CrawlerConfig`], or with the `with_*` builder methods.
#[derive(Clone)]
pub struct CrawlerSettings {
    /// Time to wait before abandoning a fetch that does not respond
    pub fetch_timeout: Duration,

    /// Idle time after the last successful fetch before the crawl stops
    pub crawl_timeout: Duration,

    /// Number of concurrent fetches, 0 means unbounded
    pub concurrency: usize,

    /// Maximum depth, 0 means unlimited
    pub max_depth: usize,

    /// User agent header, also selects the robots.txt group to follow
    pub user_agent: String,

    /// Fixed delay the randomized politeness delay is derived from
    pub politeness_delay: Duration,

    /// Parser used by the HTTP fetcher to extract links
    pub parser: Arc<dyn Parser>,
}

impl CrawlerSettings {
    /// Creates default settings using the given user agent
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..Self::default()
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_crawl_timeout(mut self, timeout: Duration) -> Self {
        self.crawl_timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_politeness_delay(mut self, delay: Duration) -> Self {
        self.politeness_delay = delay;
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn Parser>) -> Self {
        self.parser = parser;
        self
    }

    /// Returns true if an entry at `depth` may have its links followed
    pub fn can_expand(&self, depth: usize) -> bool {
        self.max_depth == 0 || depth < self.max_depth
    }
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

impl From<&CrawlerConfig> for CrawlerSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
            crawl_timeout: Duration::from_millis(config.crawl_timeout_ms),
            concurrency: config.concurrency,
            max_depth: config.max_depth,
            user_agent: config.user_agent.clone(),
            politeness_delay: Duration::from_millis(config.politeness_delay_ms),
            parser: Arc::new(HtmlParser::new()),
        }
    }
}

impl fmt::Debug for CrawlerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlerSettings")
            .field("fetch_timeout", &self.fetch_timeout)
            .field("crawl_timeout", &self.crawl_timeout)
            .field("concurrency", &self.concurrency)
            .field("max_depth", &self.max_depth)
            .field("user_agent", &self.user_agent)
            .field("politeness_delay", &self.politeness_delay)
            .finish_non_exhaustive()
    }
}
