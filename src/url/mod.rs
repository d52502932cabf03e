//! URL handling module
//!
//! This module provides seed validation, link normalization, domain key
//! extraction, and the subdomain scope check used by the crawl rules.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{domain_root, same_subdomain};
pub use normalize::{normalize_link, parse_seed};
