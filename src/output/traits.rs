//! Output handler trait and the JSON-lines writer
//!
//! This module defines the interface crawl events are written through and
//! its newline-delimited JSON implementation.

use super::{CrawlEvent, FailedFetch, ParsedResult, StopReason};
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for output handlers
///
/// Output handlers receive crawl events as they are produced and finish
/// once the crawl is over.
pub trait OutputHandler {
    /// Records a successfully parsed page
    fn record_result(&mut self, result: &ParsedResult) -> OutputResult<()>;

    /// Records a failed fetch
    fn record_failure(&mut self, failure: &FailedFetch) -> OutputResult<()>;

    /// Records any crawl event
    fn record_event(&mut self, event: &CrawlEvent) -> OutputResult<()> {
        match event {
            CrawlEvent::Parsed(result) => self.record_result(result),
            CrawlEvent::Failed(failure) => self.record_failure(failure),
        }
    }

    /// Finalizes the output, performing any cleanup or final writes
    ///
    /// # Arguments
    ///
    /// * `stop_reason` - Why the crawl ended
    fn finalize(&mut self, stop_reason: StopReason) -> OutputResult<()>;
}

/// Writes one JSON object per line
///
/// Parsed pages are written as `{"url": ..., "links": [...]}`. Failures are
/// only written when enabled with [`JsonLinesOutput::with_failures`], tagged
/// so they can be told apart from results.
pub struct JsonLinesOutput<W: Write> {
    writer: W,
    include_failures: bool,
    lines_written: usize,
}

impl<W: Write> JsonLinesOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            include_failures: false,
            lines_written: 0,
        }
    }

    pub fn with_failures(mut self, include_failures: bool) -> Self {
        self.include_failures = include_failures;
        self
    }

    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line<T: serde::Serialize>(&mut self, value: &T) -> OutputResult<()> {
        serde_json::to_writer(&mut self.writer, value)?;
        self.writer.write_all(b"\n")?;
        self.lines_written += 1;
        Ok(())
    }
}

impl<W: Write> OutputHandler for JsonLinesOutput<W> {
    fn record_result(&mut self, result: &ParsedResult) -> OutputResult<()> {
        self.write_line(result)
    }

    fn record_failure(&mut self, failure: &FailedFetch) -> OutputResult<()> {
        if !self.include_failures {
            return Ok(());
        }
        self.write_line(&CrawlEvent::Failed(failure.clone()))
    }

    fn finalize(&mut self, stop_reason: StopReason) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::Write(format!("flush after {}: {}", stop_reason, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str, links: &[&str]) -> ParsedResult {
        ParsedResult {
            url: url.to_string(),
            links: links.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn failure() -> FailedFetch {
        FailedFetch {
            url: "http://example.com/slow".to_string(),
            depth: 1,
            error: "Timed out fetching http://example.com/slow".to_string(),
            timeout: true,
        }
    }

    #[test]
    fn test_writes_one_result_per_line() {
        let mut output = JsonLinesOutput::new(Vec::new());
        output
            .record_result(&result("http://example.com/", &["http://example.com/a"]))
            .unwrap();
        output
            .record_event(&CrawlEvent::Parsed(result("http://example.com/a", &[])))
            .unwrap();
        output.finalize(StopReason::FrontierExhausted).unwrap();
        assert_eq!(output.lines_written(), 2);

        let text = String::from_utf8(output.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: ParsedResult = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.url, "http://example.com/");
        assert_eq!(first.links, vec!["http://example.com/a"]);
    }

    #[test]
    fn test_failures_skipped_by_default() {
        let mut output = JsonLinesOutput::new(Vec::new());
        output.record_failure(&failure()).unwrap();
        assert_eq!(output.lines_written(), 0);
        assert!(output.into_inner().is_empty());
    }

    #[test]
    fn test_failures_written_when_enabled() {
        let mut output = JsonLinesOutput::new(Vec::new()).with_failures(true);
        output.record_event(&CrawlEvent::Failed(failure())).unwrap();

        let text = String::from_utf8(output.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["event"], "failed");
        assert_eq!(value["timeout"], true);
    }
}
