//! Output module for crawl results and reports
//!
//! This module handles:
//! - The per-page result record emitted by a crawl
//! - Streaming crawl events and collecting them into a report
//! - Writing results as JSON lines
//! - Computing and printing crawl statistics

pub mod stats;
mod traits;

pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{JsonLinesOutput, OutputError, OutputHandler, OutputResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A successfully fetched and parsed page
///
/// Serialized as `{"url": "...", "links": ["...", ...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedResult {
    /// The page URL
    pub url: String,

    /// Absolute URLs found on the page, in document order
    pub links: Vec<String>,
}

/// A fetch that timed out or failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFetch {
    pub url: String,
    pub depth: usize,
    pub error: String,
    /// True when the failure was a fetch timeout
    pub timeout: bool,
}

/// Something a running crawl reports as it happens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CrawlEvent {
    Parsed(ParsedResult),
    Failed(FailedFetch),
}

/// Why a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The frontier emptied with every worker idle
    FrontierExhausted,

    /// No page was fetched successfully within the crawl timeout
    IdleTimeout,

    /// The caller cancelled the crawl
    Cancelled,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FrontierExhausted => "frontier exhausted",
            Self::IdleTimeout => "idle timeout",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a finished crawl produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    /// Parsed pages, in completion order
    pub results: Vec<ParsedResult>,

    /// Failed fetches, in completion order
    pub failures: Vec<FailedFetch>,

    pub stop_reason: StopReason,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Creates an empty report for a crawl that started at `started_at`
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            results: Vec::new(),
            failures: Vec::new(),
            stop_reason: StopReason::FrontierExhausted,
            started_at,
            finished_at: started_at,
        }
    }

    /// Adds an event to the report
    pub fn record(&mut self, event: CrawlEvent) {
        match event {
            CrawlEvent::Parsed(result) => self.results.push(result),
            CrawlEvent::Failed(failure) => self.failures.push(failure),
        }
    }

    /// Marks the report as finished now
    pub fn finish(&mut self, stop_reason: StopReason) {
        self.stop_reason = stop_reason;
        self.finished_at = Utc::now();
    }

    /// Wall-clock duration of the crawl
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Looks up the result for a page URL
    pub fn result_for(&self, url: &str) -> Option<&ParsedResult> {
        self.results.iter().find(|r| r.url == url)
    }
}
