/// Entry and crawl state definitions
///
/// This module defines the lifecycle of a frontier entry and of a crawl as a whole.
use std::fmt;

/// Represents the current state of a frontier entry
///
/// `Queued -> Fetching -> {Parsed, Failed} -> Done`. Entries denied by the
/// crawl rules, or abandoned while draining, go straight from `Queued` to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// Entry is in the frontier waiting for a worker
    Queued,

    /// A request for the entry is in flight
    Fetching,

    /// The page was fetched and its links extracted
    Parsed,

    /// The fetch timed out or failed
    Failed,

    /// Processing is over
    Done,
}

impl EntryState {
    /// Returns true if no further processing happens from this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: EntryState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Fetching)
                | (Self::Queued, Self::Done)
                | (Self::Fetching, Self::Parsed)
                | (Self::Fetching, Self::Failed)
                | (Self::Parsed, Self::Done)
                | (Self::Failed, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Parsed => "parsed",
            Self::Failed => "failed",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the state of a whole crawl
///
/// `Running -> Draining -> Stopped`, or `Running -> Stopped` when the
/// frontier empties with every worker idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    /// New frontier entries are admitted
    Running,

    /// No new entries are admitted; in-flight fetches are finishing
    Draining,

    /// The crawl is over
    Stopped,
}

impl CrawlState {
    /// Returns true while new frontier entries may be admitted
    pub fn is_admitting(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
