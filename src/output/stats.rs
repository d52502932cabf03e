//! Statistics generation from a crawl report
//!
//! This module provides functionality for summarising and displaying
//! what a crawl produced.

use super::{CrawlReport, StopReason};
use std::collections::HashSet;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatistics {
    /// Number of pages fetched and parsed
    pub pages_parsed: u64,

    /// Number of fetches that failed, timeouts included
    pub failures: u64,

    /// Number of fetches that timed out
    pub timeouts: u64,

    /// Total number of links found across all pages
    pub links_found: u64,

    /// Number of distinct links found
    pub unique_links: u64,

    pub stop_reason: StopReason,

    pub duration: Duration,
}

impl CrawlStatistics {
    /// Computes statistics from a finished report
    pub fn from_report(report: &CrawlReport) -> Self {
        let links_found = report.results.iter().map(|r| r.links.len() as u64).sum();
        let unique_links = report
            .results
            .iter()
            .flat_map(|r| r.links.iter())
            .collect::<HashSet<_>>()
            .len() as u64;

        Self {
            pages_parsed: report.results.len() as u64,
            failures: report.failures.len() as u64,
            timeouts: report.failures.iter().filter(|f| f.timeout).count() as u64,
            links_found,
            unique_links,
            stop_reason: report.stop_reason,
            duration: report.duration().to_std().unwrap_or_default(),
        }
    }

    /// Returns the share of attempted fetches that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.pages_parsed + self.failures;
        if attempted == 0 {
            return 0.0;
        }
        (self.pages_parsed as f64 / attempted as f64) * 100.0
    }
}

/// Prints statistics to stderr in a formatted manner
///
/// Results may be streaming to stdout, so the summary stays out of the way.
pub fn print_statistics(stats: &CrawlStatistics) {
    eprintln!("=== Crawl Statistics ===\n");

    eprintln!("Overview:");
    eprintln!("  Pages parsed: {}", stats.pages_parsed);
    eprintln!("  Links found: {}", stats.links_found);
    eprintln!("  Unique links: {}", stats.unique_links);
    eprintln!();

    if stats.failures > 0 {
        eprintln!("Failures:");
        eprintln!("  Timeouts: {}", stats.timeouts);
        eprintln!("  Other: {}", stats.failures - stats.timeouts);
        eprintln!();
    }

    eprintln!("Stopped: {} after {:.1}s", stats.stop_reason, stats.duration.as_secs_f64());
    eprintln!(
        "Success Rate: {:.1}% ({} / {} fetches)",
        stats.success_rate(),
        stats.pages_parsed,
        stats.pages_parsed + stats.failures
    );
}
