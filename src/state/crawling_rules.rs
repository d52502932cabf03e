use crate::robots::Group;
use crate::state::VisitedCache;
use crate::url::same_subdomain;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use url::Url;

/// The mutable part of a domain's policy, guarded by one lock
#[derive(Debug, Default)]
struct Guarded {
    robots_group: Option<Arc<Group>>,
    last_delay: Duration,
}

/// Crawl policy for one domain
///
/// Decides whether a URL may be fetched (robots rules, domain scope, dedup)
/// and how long to wait before the next request to the domain. One instance
/// exists per crawled domain for the duration of a crawl.
pub struct CrawlingRules {
    base_domain: Url,
    cache: Arc<dyn VisitedCache>,
    fixed_delay: Duration,
    guarded: RwLock<Guarded>,
}

impl CrawlingRules {
    /// Creates rules for `base_domain` with no robots group attached
    pub fn new(base_domain: Url, cache: Arc<dyn VisitedCache>, fixed_delay: Duration) -> Self {
        Self {
            base_domain,
            cache,
            fixed_delay,
            guarded: RwLock::new(Guarded::default()),
        }
    }

    pub fn base_domain(&self) -> &Url {
        &self.base_domain
    }

    /// Installs a newly parsed robots group, replacing any previous one
    pub fn set_group(&self, group: Option<Group>) {
        let mut guarded = self.guarded.write().unwrap_or_else(PoisonError::into_inner);
        guarded.robots_group = group.map(Arc::new);
    }

    /// The robots group currently attached, if any
    pub fn group(&self) -> Option<Arc<Group>> {
        let guarded = self.guarded.read().unwrap_or_else(PoisonError::into_inner);
        guarded.robots_group.clone()
    }

    /// Records the response time last observed from the domain
    pub fn update_last_delay(&self, delay: Duration) {
        let mut guarded = self.guarded.write().unwrap_or_else(PoisonError::into_inner);
        guarded.last_delay = delay;
    }

    pub fn last_delay(&self) -> Duration {
        self.guarded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last_delay
    }

    /// Tests whether `url` may be crawled
    ///
    /// The URL is marked visited on its first evaluation whatever the
    /// outcome, so every later call for the same URL returns false.
    pub fn allowed(&self, url: &Url) -> bool {
        if !self
            .cache
            .check_and_set(self.base_domain.as_str(), url.as_str())
        {
            return false;
        }

        let in_scope = same_subdomain(&self.base_domain, url);
        match self.group() {
            Some(group) => group.test(&request_path(url)) && in_scope,
            None => in_scope,
        }
    }

    /// Computes the delay to wait before the next request to the domain
    ///
    /// The result is never below the robots crawl-delay nor below the last
    /// observed response time, and never below a random jitter drawn from
    /// `[0.5, 1.5) x fixed_delay`.
    pub fn crawl_delay(&self) -> Duration {
        let guarded = self.guarded.read().unwrap_or_else(PoisonError::into_inner);

        let robots_delay = guarded
            .robots_group
            .as_ref()
            .map_or(Duration::ZERO, |g| g.crawl_delay());

        let base = jitter(self.fixed_delay).max(robots_delay);
        let delay = base.max(guarded.last_delay);

        tracing::trace!(
            "Crawl delay for {}: {:?} (robots {:?}, last {:?})",
            self.base_domain,
            delay,
            robots_delay,
            guarded.last_delay
        );
        delay
    }
}

/// Draws a uniformly random delay in `[0.5 x fixed, 1.5 x fixed)`
fn jitter(fixed: Duration) -> Duration {
    let nanos = u64::try_from(fixed.as_nanos()).unwrap_or(u64::MAX / 2);
    if nanos == 0 {
        return Duration::ZERO;
    }
    let min = nanos / 2;
    let max = nanos.saturating_add(nanos / 2).max(min + 1);
    Duration::from_nanos(fastrand::u64(min..max))
}

/// Path plus query, the part of a URL robots rules are tested against
fn request_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
