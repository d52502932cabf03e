//! Configuration module for the crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and turns them into the immutable [`CrawlerSettings`] snapshot a crawl runs with.
//!
//! # Example
//!
//! ```no_run
//! use polite_crawler::config::{load_config, CrawlerSettings};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! let settings = CrawlerSettings::from(&config.crawler);
//! println!("Crawler will use max depth: {}", settings.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, CrawlerSettings, DEFAULT_CONCURRENCY, DEFAULT_CRAWL_TIMEOUT_MS,
    DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_MAX_DEPTH, DEFAULT_POLITENESS_DELAY_MS, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{validate, validate_settings};
