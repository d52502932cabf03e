//! State module for crawl policy and progress
//!
//! # Components
//!
//! - `CrawlingRules`: per-domain allow/deny decisions and politeness delay
//! - `VisitedCache`: per-domain dedup store, with an in-memory implementation
//! - `EntryState` / `CrawlState`: lifecycle of frontier entries and of the crawl

mod crawling_rules;
mod page_state;
mod visited;

// Re-export main types
pub use crawling_rules::CrawlingRules;
pub use page_state::{CrawlState, EntryState};
pub use visited::{MemoryCache, VisitedCache};
