//! Visited-URL cache capability

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

/// Per-domain set membership store used for URL dedup
///
/// Implementations must be safe to share between concurrent workers.
pub trait VisitedCache: Send + Sync {
    /// Records `url_key` as seen for `domain_key`
    fn set(&self, domain_key: &str, url_key: &str);

    /// Returns true if `url_key` was already recorded for `domain_key`
    fn contains(&self, domain_key: &str, url_key: &str) -> bool;

    /// Records `url_key` and returns true only if it was not already present
    ///
    /// The default implementation is a plain contains-then-set; stores that
    /// can do better should make it atomic, so that at most one caller ever
    /// sees `true` for a given key.
    fn check_and_set(&self, domain_key: &str, url_key: &str) -> bool {
        if self.contains(domain_key, url_key) {
            return false;
        }
        self.set(domain_key, url_key);
        true
    }
}

/// In-memory visited cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    seen: Mutex<HashMap<String, HashSet<String>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of URLs recorded for a domain
    pub fn len(&self, domain_key: &str) -> usize {
        let seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.get(domain_key).map_or(0, HashSet::len)
    }

    pub fn is_empty(&self, domain_key: &str) -> bool {
        self.len(domain_key) == 0
    }
}

impl VisitedCache for MemoryCache {
    fn set(&self, domain_key: &str, url_key: &str) {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.entry(domain_key.to_string())
            .or_default()
            .insert(url_key.to_string());
    }

    fn contains(&self, domain_key: &str, url_key: &str) -> bool {
        let seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.get(domain_key)
            .is_some_and(|urls| urls.contains(url_key))
    }

    fn check_and_set(&self, domain_key: &str, url_key: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.entry(domain_key.to_string())
            .or_default()
            .insert(url_key.to_string())
    }
}
