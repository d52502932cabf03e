//! Frontier and per-domain rule registry
//!
//! This module handles:
//! - FIFO queue management for URLs waiting to be crawled
//! - Creating one set of crawl rules per domain, lazily
//! - Loading each domain's robots.txt exactly once, before any URL of the
//!   domain is evaluated

use crate::config::CrawlerSettings;
use crate::crawler::LinkFetcher;
use crate::robots::load_group;
use crate::state::{CrawlingRules, VisitedCache};
use crate::url::domain_root;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use url::Url;

/// A URL queued for fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// The URL to fetch
    pub url: Url,

    /// Link distance from the seed (seeds are depth 0)
    pub depth: usize,

    /// Root of the seed this entry descends from; selects the crawl rules
    pub origin: Url,
}

impl FrontierEntry {
    /// Creates a depth-0 entry for a seed URL
    pub fn seed(url: Url) -> Self {
        let origin = domain_root(&url);
        Self {
            url,
            depth: 0,
            origin,
        }
    }

    /// Creates an entry for a link found on this entry's page
    pub fn child(&self, url: Url) -> Self {
        Self {
            url,
            depth: self.depth + 1,
            origin: self.origin.clone(),
        }
    }
}

/// FIFO queue of URLs waiting for a worker
///
/// Entries are handed out in insertion order, so the crawl proceeds
/// breadth-first when workers run at similar speeds.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry at the back of the queue
    pub fn push(&mut self, entry: FrontierEntry) {
        self.queue.push_back(entry);
    }

    /// Takes the oldest entry
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drops every queued entry, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }
}

impl Extend<FrontierEntry> for Frontier {
    fn extend<I: IntoIterator<Item = FrontierEntry>>(&mut self, iter: I) {
        self.queue.extend(iter);
    }
}

/// Lazily built crawl rules, one per domain
///
/// The first worker to ask for a domain creates its rules and loads its
/// robots.txt; concurrent callers for the same domain wait for that load to
/// finish, so no URL is ever judged before the domain's robots group is in
/// place.
pub struct DomainRegistry {
    domains: Mutex<HashMap<String, Arc<OnceCell<Arc<CrawlingRules>>>>>,
    fetcher: Arc<dyn LinkFetcher>,
    cache: Arc<dyn VisitedCache>,
    settings: Arc<CrawlerSettings>,
}

impl DomainRegistry {
    /// Creates an empty registry
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Used to download robots.txt
    /// * `cache` - Visited cache shared by every domain's rules
    /// * `settings` - Supplies the user agent and the politeness delay
    pub fn new(
        fetcher: Arc<dyn LinkFetcher>,
        cache: Arc<dyn VisitedCache>,
        settings: Arc<CrawlerSettings>,
    ) -> Self {
        Self {
            domains: Mutex::new(HashMap::new()),
            fetcher,
            cache,
            settings,
        }
    }

    /// Returns the rules for the domain rooted at `origin`, creating them on first use
    pub async fn rules_for(&self, origin: &Url) -> Arc<CrawlingRules> {
        let cell = {
            let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(domains.entry(origin.as_str().to_string()).or_default())
        };

        cell.get_or_init(|| async {
            tracing::debug!("Initializing crawl rules for {}", origin);
            let rules = CrawlingRules::new(
                origin.clone(),
                Arc::clone(&self.cache),
                self.settings.politeness_delay,
            );
            let group = load_group(self.fetcher.as_ref(), origin, &self.settings.user_agent).await;
            rules.set_group(group);
            Arc::new(rules)
        })
        .await
        .clone()
    }

    /// Number of domains seen so far
    pub fn len(&self) -> usize {
        self.domains
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
