//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the dispatcher loop that coordinates a crawl:
//! - Managing the frontier queue and the pool of entry tasks
//! - Applying each domain's crawl rules and politeness delay before a fetch
//! - Expanding links up to the depth limit
//! - Stopping on an empty frontier, an idle timeout, or cancellation
//! - Streaming results and failures as they happen

use crate::config::{validate_settings, CrawlerSettings};
use crate::crawler::scheduler::{DomainRegistry, Frontier, FrontierEntry};
use crate::crawler::{HttpFetcher, LinkFetcher};
use crate::output::{CrawlEvent, CrawlReport, FailedFetch, ParsedResult, StopReason};
use crate::state::{CrawlState, EntryState, MemoryCache, VisitedCache};
use crate::url::{normalize_link, parse_seed};
use crate::{ConfigResult, FetchError, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Stand-in deadline for idle timeouts too large to represent
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// How the processing of one frontier entry ended
#[derive(Debug)]
enum EntryOutcome {
    /// Already visited, out of scope, or disallowed by robots.txt
    Denied(FrontierEntry),

    /// Dropped before fetching because the crawl started draining
    Abandoned(FrontierEntry),

    Parsed(FrontierEntry, Vec<Url>),

    Failed(FrontierEntry, FetchError),
}

impl EntryOutcome {
    fn entry(&self) -> &FrontierEntry {
        match self {
            Self::Denied(entry)
            | Self::Abandoned(entry)
            | Self::Parsed(entry, _)
            | Self::Failed(entry, _) => entry,
        }
    }

    /// State the entry task left the entry in
    fn reached(&self) -> EntryState {
        match self {
            Self::Denied(_) | Self::Abandoned(_) => EntryState::Done,
            Self::Parsed(..) => EntryState::Parsed,
            Self::Failed(..) => EntryState::Failed,
        }
    }
}

/// State shared by every entry task of one crawl
struct WorkerContext {
    registry: DomainRegistry,
    fetcher: Arc<dyn LinkFetcher>,
    drain: CancellationToken,
}

/// Running totals for progress logging
#[derive(Debug, Default)]
struct Progress {
    parsed: usize,
    failed: usize,
    denied: usize,
    abandoned: usize,
}

/// Polite, depth-bounded web crawler
///
/// A crawler is built once from validated settings and may run any number
/// of crawls. Each crawl gets its own frontier and per-domain rules; the
/// visited cache is fresh per crawl unless one is supplied with
/// [`WebCrawler::with_cache`].
pub struct WebCrawler {
    settings: Arc<CrawlerSettings>,
    fetcher: Arc<dyn LinkFetcher>,
    cache: Option<Arc<dyn VisitedCache>>,
}

impl WebCrawler {
    /// Creates a crawler that fetches over HTTP
    ///
    /// # Arguments
    ///
    /// * `settings` - The crawler settings
    ///
    /// # Returns
    ///
    /// * `Ok(WebCrawler)` - Settings were valid and the HTTP client was built
    /// * `Err(CrawlerError)` - Invalid settings or HTTP client failure
    pub fn new(settings: CrawlerSettings) -> Result<Self> {
        validate_settings(&settings)?;
        let fetcher = HttpFetcher::new(&settings)?;
        Ok(Self {
            settings: Arc::new(settings),
            fetcher: Arc::new(fetcher),
            cache: None,
        })
    }

    /// Creates a crawler that uses the given fetch capability
    pub fn with_fetcher(
        settings: CrawlerSettings,
        fetcher: Arc<dyn LinkFetcher>,
    ) -> ConfigResult<Self> {
        validate_settings(&settings)?;
        Ok(Self {
            settings: Arc::new(settings),
            fetcher,
            cache: None,
        })
    }

    /// Uses `cache` as the visited cache of every crawl
    pub fn with_cache(mut self, cache: Arc<dyn VisitedCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn settings(&self) -> &CrawlerSettings {
        &self.settings
    }

    /// Crawls from the given seed URLs and collects everything produced
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl ran; per-URL failures are in the report
    /// * `Err(CrawlerError)` - A seed URL was unusable; nothing was fetched
    pub async fn crawl<S: AsRef<str>>(
        &self,
        seeds: &[S],
        cancel: CancellationToken,
    ) -> Result<CrawlReport> {
        let seeds = seeds
            .iter()
            .map(|seed| parse_seed(seed.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(self.crawl_urls(&seeds, cancel).await)
    }

    /// Crawls from already parsed seed URLs and collects everything produced
    pub async fn crawl_urls(&self, seeds: &[Url], cancel: CancellationToken) -> CrawlReport {
        let mut report = CrawlReport::new(Utc::now());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let stop_reason = self.run(seeds, cancel, tx).await;
        while let Some(event) = rx.recv().await {
            report.record(event);
        }

        report.finish(stop_reason);
        report
    }

    /// Runs a crawl, streaming results and failures to `events`
    ///
    /// This is the core dispatcher loop that:
    /// 1. Admits frontier entries as tasks, up to the concurrency limit
    /// 2. Waits for a task to finish, the idle deadline, or cancellation
    /// 3. Reports the task's outcome and enqueues its links
    /// 4. Stops admitting once draining, and returns when no task is left
    ///
    /// Returns why the crawl ended.
    pub async fn run(
        &self,
        seeds: &[Url],
        cancel: CancellationToken,
        events: UnboundedSender<CrawlEvent>,
    ) -> StopReason {
        let cache = self
            .cache
            .clone()
            .unwrap_or_else(|| Arc::new(MemoryCache::new()));
        let drain = cancel.child_token();
        let context = Arc::new(WorkerContext {
            registry: DomainRegistry::new(
                Arc::clone(&self.fetcher),
                cache,
                Arc::clone(&self.settings),
            ),
            fetcher: Arc::clone(&self.fetcher),
            drain: drain.clone(),
        });

        let mut frontier = Frontier::new();
        frontier.extend(seeds.iter().cloned().map(FrontierEntry::seed));

        let mut tasks: JoinSet<EntryOutcome> = JoinSet::new();
        let mut state = CrawlState::Running;
        let mut stop_reason = StopReason::FrontierExhausted;
        let mut progress = Progress::default();
        let mut last_success = Instant::now();
        let start_time = last_success;

        tracing::info!(
            "Crawl {}: {} seed(s), concurrency {}, max depth {}",
            state,
            frontier.len(),
            self.settings.concurrency,
            self.settings.max_depth
        );

        loop {
            if state.is_admitting() {
                if cancel.is_cancelled() {
                    stop_reason = StopReason::Cancelled;
                    state = begin_draining(stop_reason, &drain, &frontier, tasks.len());
                } else {
                    self.admit(&mut frontier, &mut tasks, &context);
                }
            }

            if tasks.is_empty() {
                break;
            }

            let deadline = idle_deadline(last_success, self.settings.crawl_timeout);
            tokio::select! {
                _ = cancel.cancelled(), if state.is_admitting() => {
                    stop_reason = StopReason::Cancelled;
                    state = begin_draining(stop_reason, &drain, &frontier, tasks.len());
                }
                _ = tokio::time::sleep_until(deadline), if state.is_admitting() => {
                    stop_reason = StopReason::IdleTimeout;
                    state = begin_draining(stop_reason, &drain, &frontier, tasks.len());
                }
                Some(joined) = tasks.join_next() => match joined {
                    Ok(outcome) => {
                        let parsed =
                            self.handle_outcome(outcome, state, &mut frontier, &events, &mut progress);
                        if parsed {
                            last_success = Instant::now();
                            if progress.parsed % 10 == 0 {
                                let elapsed = start_time.elapsed().as_secs_f64();
                                tracing::info!(
                                    "Progress: {} pages parsed, {} in frontier, {} in flight, {:.2} pages/sec",
                                    progress.parsed,
                                    frontier.len(),
                                    tasks.len(),
                                    progress.parsed as f64 / elapsed.max(f64::EPSILON)
                                );
                            }
                        }
                    }
                    Err(e) => tracing::error!("Crawl task failed: {}", e),
                },
            }
        }

        let dropped = frontier.clear();
        state = CrawlState::Stopped;
        tracing::info!(
            "Crawl {} ({}) after {:?}: {} parsed, {} failed, {} denied, {} abandoned, {} queued entries dropped",
            state,
            stop_reason,
            start_time.elapsed(),
            progress.parsed,
            progress.failed,
            progress.denied,
            progress.abandoned,
            dropped
        );

        stop_reason
    }

    /// Spawns tasks for queued entries while under the concurrency limit
    fn admit(
        &self,
        frontier: &mut Frontier,
        tasks: &mut JoinSet<EntryOutcome>,
        context: &Arc<WorkerContext>,
    ) {
        let limit = self.settings.concurrency;
        while limit == 0 || tasks.len() < limit {
            let Some(entry) = frontier.pop() else {
                break;
            };
            tasks.spawn(process_entry(Arc::clone(context), entry));
        }
    }

    /// Reports a finished entry and enqueues its links
    ///
    /// Returns true if the entry's page was fetched and parsed.
    fn handle_outcome(
        &self,
        outcome: EntryOutcome,
        state: CrawlState,
        frontier: &mut Frontier,
        events: &UnboundedSender<CrawlEvent>,
        progress: &mut Progress,
    ) -> bool {
        let url = outcome.entry().url.clone();
        let reached = outcome.reached();

        let parsed = match outcome {
            EntryOutcome::Denied(entry) => {
                tracing::debug!("Skipping {} (visited, out of scope, or disallowed)", entry.url);
                progress.denied += 1;
                false
            }
            EntryOutcome::Abandoned(entry) => {
                tracing::debug!("Abandoned {} while draining", entry.url);
                progress.abandoned += 1;
                false
            }
            EntryOutcome::Parsed(entry, links) => {
                tracing::debug!(
                    "Parsed {} (depth {}): {} links",
                    entry.url,
                    entry.depth,
                    links.len()
                );
                progress.parsed += 1;

                if state.is_admitting() && self.settings.can_expand(entry.depth) {
                    frontier.extend(links.iter().cloned().map(|link| entry.child(link)));
                }

                emit(
                    events,
                    CrawlEvent::Parsed(ParsedResult {
                        url: entry.url.to_string(),
                        links: links.into_iter().map(String::from).collect(),
                    }),
                );
                true
            }
            EntryOutcome::Failed(entry, error) => {
                tracing::warn!("Failed to fetch {}: {}", entry.url, error);
                progress.failed += 1;

                emit(
                    events,
                    CrawlEvent::Failed(FailedFetch {
                        url: entry.url.to_string(),
                        depth: entry.depth,
                        error: error.to_string(),
                        timeout: error.is_timeout(),
                    }),
                );
                false
            }
        };

        complete(&url, reached);
        parsed
    }
}

/// Processes one frontier entry: rules check, politeness wait, fetch
async fn process_entry(context: Arc<WorkerContext>, entry: FrontierEntry) -> EntryOutcome {
    let rules = tokio::select! {
        biased;
        _ = context.drain.cancelled() => {
            transition(&entry.url, EntryState::Queued, EntryState::Done);
            return EntryOutcome::Abandoned(entry);
        }
        rules = context.registry.rules_for(&entry.origin) => rules,
    };

    if !rules.allowed(&entry.url) {
        transition(&entry.url, EntryState::Queued, EntryState::Done);
        return EntryOutcome::Denied(entry);
    }

    let delay = rules.crawl_delay();
    tokio::select! {
        biased;
        _ = context.drain.cancelled() => {
            transition(&entry.url, EntryState::Queued, EntryState::Done);
            return EntryOutcome::Abandoned(entry);
        }
        _ = tokio::time::sleep(delay) => {}
    }

    transition(&entry.url, EntryState::Queued, EntryState::Fetching);
    let (elapsed, result) = context.fetcher.fetch_links(&entry.url).await;

    match result {
        Ok(links) => {
            rules.update_last_delay(elapsed);
            transition(&entry.url, EntryState::Fetching, EntryState::Parsed);
            let links = links.into_iter().filter_map(normalize_link).collect();
            EntryOutcome::Parsed(entry, links)
        }
        Err(error) => {
            if error.has_response() {
                rules.update_last_delay(elapsed);
            }
            transition(&entry.url, EntryState::Fetching, EntryState::Failed);
            EntryOutcome::Failed(entry, error)
        }
    }
}

/// Stops admission and wakes tasks still waiting out their delay
fn begin_draining(
    reason: StopReason,
    drain: &CancellationToken,
    frontier: &Frontier,
    in_flight: usize,
) -> CrawlState {
    tracing::info!(
        "Crawl {} -> {} ({}): {} in flight, {} queued",
        CrawlState::Running,
        CrawlState::Draining,
        reason,
        in_flight,
        frontier.len()
    );
    drain.cancel();
    CrawlState::Draining
}

fn idle_deadline(last_success: Instant, crawl_timeout: Duration) -> Instant {
    last_success
        .checked_add(crawl_timeout)
        .unwrap_or_else(|| Instant::now() + FAR_FUTURE)
}

fn transition(url: &Url, from: EntryState, to: EntryState) {
    debug_assert!(from.can_transition_to(to), "{} -> {}", from, to);
    tracing::trace!("{}: {} -> {}", url, from, to);
}

/// Moves a reported entry to its terminal state
fn complete(url: &Url, reached: EntryState) -> EntryState {
    if !reached.is_terminal() {
        transition(url, reached, EntryState::Done);
    }
    EntryState::Done
}

fn emit(events: &UnboundedSender<CrawlEvent>, event: CrawlEvent) {
    if events.send(event).is_err() {
        tracing::debug!("Crawl event receiver dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{FetchResponse, Fetcher, Timed};
    use crate::CrawlerError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// A fixed set of pages, robots files, errors and latencies
    #[derive(Default)]
    struct FakeWeb {
        pages: HashMap<String, Vec<String>>,
        robots: HashMap<String, String>,
        errors: HashMap<String, FetchError>,
        latency: HashMap<String, Duration>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeWeb {
        fn page(mut self, url: &str, links: &[&str]) -> Self {
            self.pages
                .insert(url.to_string(), links.iter().map(|l| l.to_string()).collect());
            self
        }

        fn robots(mut self, root: &str, body: &str) -> Self {
            self.robots
                .insert(format!("{}robots.txt", root), body.to_string());
            self
        }

        fn error(mut self, url: &str, error: FetchError) -> Self {
            self.errors.insert(url.to_string(), error);
            self
        }

        fn latency(mut self, url: &str, latency: Duration) -> Self {
            self.latency.insert(url.to_string(), latency);
            self
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for FakeWeb {
        async fn fetch(&self, url: &Url) -> Timed<FetchResponse> {
            let (status, body) = match self.robots.get(url.as_str()) {
                Some(body) => (200, body.clone()),
                None => (404, String::new()),
            };
            (
                Duration::ZERO,
                Ok(FetchResponse {
                    url: url.clone(),
                    status,
                    content_type: Some("text/plain".to_string()),
                    body,
                }),
            )
        }
    }

    #[async_trait]
    impl LinkFetcher for FakeWeb {
        async fn fetch_links(&self, url: &Url) -> Timed<Vec<Url>> {
            self.fetched.lock().unwrap().push(url.to_string());

            let latency = self.latency.get(url.as_str()).copied().unwrap_or_default();
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }

            if let Some(error) = self.errors.get(url.as_str()) {
                return (latency, Err(error.clone()));
            }
            match self.pages.get(url.as_str()) {
                Some(links) => (
                    latency,
                    Ok(links.iter().map(|l| Url::parse(l).unwrap()).collect()),
                ),
                None => (
                    latency,
                    Err(FetchError::Status {
                        url: url.to_string(),
                        status: 404,
                    }),
                ),
            }
        }
    }

    /// An endless chain: `/n` links to `/n+1`; pages from `slow_from` on are slow
    struct ChainWeb {
        slow_from: usize,
        latency: Duration,
        fetched: AtomicUsize,
    }

    impl ChainWeb {
        fn new(slow_from: usize, latency: Duration) -> Self {
            Self {
                slow_from,
                latency,
                fetched: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetcher for ChainWeb {
        async fn fetch(&self, url: &Url) -> Timed<FetchResponse> {
            (
                Duration::ZERO,
                Ok(FetchResponse {
                    url: url.clone(),
                    status: 404,
                    content_type: None,
                    body: String::new(),
                }),
            )
        }
    }

    #[async_trait]
    impl LinkFetcher for ChainWeb {
        async fn fetch_links(&self, url: &Url) -> Timed<Vec<Url>> {
            self.fetched.fetch_add(1, Ordering::SeqCst);
            let n: usize = url.path().trim_start_matches('/').parse().unwrap();

            let latency = if n >= self.slow_from {
                self.latency
            } else {
                Duration::ZERO
            };
            tokio::time::sleep(latency).await;

            let next = url.join(&format!("/{}", n + 1)).unwrap();
            (latency, Ok(vec![next]))
        }
    }

    fn create_test_settings() -> CrawlerSettings {
        CrawlerSettings::new("TestBot/1.0")
            .with_politeness_delay(Duration::ZERO)
            .with_crawl_timeout(Duration::from_secs(5))
    }

    fn crawler(settings: CrawlerSettings, fetcher: Arc<dyn LinkFetcher>) -> WebCrawler {
        WebCrawler::with_fetcher(settings, fetcher).unwrap()
    }

    fn result_urls(report: &CrawlReport) -> Vec<String> {
        let mut urls: Vec<String> = report.results.iter().map(|r| r.url.clone()).collect();
        urls.sort();
        urls
    }

    #[tokio::test]
    async fn test_end_to_end_robots_depth_and_scope() {
        let web = Arc::new(
            FakeWeb::default()
                .robots("http://example.com/", "User-agent: *\nDisallow: /private/")
                .page(
                    "http://example.com/",
                    &[
                        "http://example.com/a",
                        "http://example.com/private/x",
                        "http://other.com/b",
                    ],
                )
                .page("http://example.com/a", &["http://example.com/c"]),
        );
        let crawler = crawler(create_test_settings().with_max_depth(1), web.clone());

        let report = crawler
            .crawl(&["http://example.com/"], CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            result_urls(&report),
            vec!["http://example.com/", "http://example.com/a"]
        );
        assert_eq!(
            report.result_for("http://example.com/").unwrap().links,
            vec![
                "http://example.com/a",
                "http://example.com/private/x",
                "http://other.com/b",
            ]
        );
        assert!(report.failures.is_empty());
        assert_eq!(report.stop_reason, StopReason::FrontierExhausted);

        let fetched = web.fetched();
        assert!(!fetched.contains(&"http://example.com/private/x".to_string()));
        assert!(!fetched.contains(&"http://other.com/b".to_string()));
        assert!(!fetched.contains(&"http://example.com/c".to_string()));
    }

    #[tokio::test]
    async fn test_depth_boundary() {
        let web = Arc::new(ChainWeb::new(usize::MAX, Duration::ZERO));
        let crawler = crawler(create_test_settings().with_max_depth(2), web.clone());

        let report = crawler
            .crawl(&["http://example.com/0"], CancellationToken::new())
            .await
            .unwrap();

        // Depths 0, 1 and 2 are fetched; the link to depth 3 is not followed
        assert_eq!(
            result_urls(&report),
            vec![
                "http://example.com/0",
                "http://example.com/1",
                "http://example.com/2",
            ]
        );
        assert_eq!(web.fetched.load(Ordering::SeqCst), 3);
        assert_eq!(report.stop_reason, StopReason::FrontierExhausted);
    }

    #[tokio::test]
    async fn test_idle_timeout_stops_endless_crawl() {
        let web = Arc::new(ChainWeb::new(3, Duration::from_millis(300)));
        let settings = create_test_settings()
            .with_max_depth(0)
            .with_crawl_timeout(Duration::from_millis(100));
        let crawler = crawler(settings, web.clone());

        let report = crawler
            .crawl(&["http://example.com/0"], CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.stop_reason, StopReason::IdleTimeout);
        // The in-flight fetch of /3 still completes and is reported, but its
        // link is not followed
        assert_eq!(report.results.len(), 4);
        assert!(report.result_for("http://example.com/3").is_some());
        assert_eq!(web.fetched.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let web = Arc::new(FakeWeb::default().page("http://example.com/", &[]));
        let crawler = crawler(create_test_settings(), web.clone());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = crawler.crawl(&["http://example.com/"], cancel).await.unwrap();

        assert_eq!(report.stop_reason, StopReason::Cancelled);
        assert!(report.results.is_empty());
        assert!(web.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_lets_in_flight_fetch_finish() {
        let web = Arc::new(ChainWeb::new(0, Duration::from_millis(200)));
        let crawler = crawler(create_test_settings().with_max_depth(0), web.clone());

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let report = crawler.crawl(&["http://example.com/0"], cancel).await.unwrap();

        assert_eq!(report.stop_reason, StopReason::Cancelled);
        assert_eq!(result_urls(&report), vec!["http://example.com/0"]);
        assert_eq!(web.fetched.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_reported_and_crawl_continues() {
        let web = Arc::new(
            FakeWeb::default()
                .page(
                    "http://example.com/",
                    &[
                        "http://example.com/slow",
                        "http://example.com/ok",
                        "http://example.com/broken",
                    ],
                )
                .page("http://example.com/ok", &[])
                .error(
                    "http://example.com/slow",
                    FetchError::Timeout {
                        url: "http://example.com/slow".to_string(),
                    },
                )
                .error(
                    "http://example.com/broken",
                    FetchError::Transport {
                        url: "http://example.com/broken".to_string(),
                        message: "connection reset".to_string(),
                    },
                ),
        );
        let crawler = crawler(create_test_settings(), web);

        let report = crawler
            .crawl(&["http://example.com/"], CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            result_urls(&report),
            vec!["http://example.com/", "http://example.com/ok"]
        );
        assert_eq!(report.failures.len(), 2);

        let slow = report
            .failures
            .iter()
            .find(|f| f.url == "http://example.com/slow")
            .unwrap();
        assert!(slow.timeout);
        assert_eq!(slow.depth, 1);

        let broken = report
            .failures
            .iter()
            .find(|f| f.url == "http://example.com/broken")
            .unwrap();
        assert!(!broken.timeout);
        assert_eq!(report.stop_reason, StopReason::FrontierExhausted);
    }

    #[tokio::test]
    async fn test_unbounded_concurrency() {
        let links: Vec<String> = (0..20).map(|i| format!("http://example.com/p{}", i)).collect();
        let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();

        let mut web = FakeWeb::default().page("http://example.com/", &link_refs);
        for link in &links {
            web = web.page(link, &[]).latency(link, Duration::from_millis(100));
        }
        let web = Arc::new(web);

        // The seed answered instantly, so all 20 pages start without delay
        let crawler = crawler(create_test_settings().with_concurrency(0), web.clone());
        let started = std::time::Instant::now();
        let report = crawler
            .crawl(&["http://example.com/"], CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.results.len(), 21);
        assert_eq!(web.fetched().len(), 21);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_single_worker_completes() {
        let web = Arc::new(
            FakeWeb::default()
                .page("http://example.com/", &["http://example.com/a", "http://example.com/b"])
                .page("http://example.com/a", &["http://example.com/b"])
                .page("http://example.com/b", &["http://example.com/"]),
        );
        let crawler = crawler(create_test_settings().with_concurrency(1), web.clone());

        let report = crawler
            .crawl(&["http://example.com/"], CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.results.len(), 3);
        // Every page is fetched once despite the cycle and the repeated link
        assert_eq!(web.fetched().len(), 3);
    }

    #[tokio::test]
    async fn test_multiple_seeds_keep_their_own_scope() {
        let web = Arc::new(
            FakeWeb::default()
                .robots("http://b.example/", "User-agent: *\nDisallow: /secret")
                .page("http://a.example/", &["http://b.example/x", "http://a.example/secret"])
                .page("http://a.example/secret", &[])
                .page("http://b.example/", &["http://a.example/y", "http://b.example/secret"]),
        );
        let crawler = crawler(create_test_settings(), web.clone());

        let report = crawler
            .crawl(
                &["http://a.example/", "http://b.example/"],
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            result_urls(&report),
            vec![
                "http://a.example/",
                "http://a.example/secret",
                "http://b.example/",
            ]
        );
        let fetched = web.fetched();
        assert!(!fetched.contains(&"http://b.example/x".to_string()));
        assert!(!fetched.contains(&"http://a.example/y".to_string()));
        assert!(!fetched.contains(&"http://b.example/secret".to_string()));
    }

    #[tokio::test]
    async fn test_robots_crawl_delay_paces_requests() {
        let web = Arc::new(
            FakeWeb::default()
                .robots("http://example.com/", "User-agent: *\nCrawl-delay: 0.2")
                .page("http://example.com/", &["http://example.com/a"])
                .page("http://example.com/a", &[]),
        );
        let crawler = crawler(create_test_settings(), web);

        let started = std::time::Instant::now();
        let report = crawler
            .crawl(&["http://example.com/"], CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.results.len(), 2);
        assert!(started.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_observed_latency_paces_next_request() {
        let web = Arc::new(
            FakeWeb::default()
                .page("http://example.com/", &["http://example.com/a"])
                .latency("http://example.com/", Duration::from_millis(150))
                .page("http://example.com/a", &[]),
        );
        let crawler = crawler(create_test_settings(), web);

        let started = std::time::Instant::now();
        let report = crawler
            .crawl(&["http://example.com/"], CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.results.len(), 2);
        // 150ms fetching the seed, then at least 150ms before fetching /a
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_run_streams_events() {
        let web = Arc::new(
            FakeWeb::default()
                .page("http://example.com/", &["http://example.com/missing"]),
        );
        let crawler = crawler(create_test_settings(), web);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let seed = Url::parse("http://example.com/").unwrap();
        let reason = crawler.run(&[seed], CancellationToken::new(), tx).await;
        assert_eq!(reason, StopReason::FrontierExhausted);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], CrawlEvent::Parsed(r) if r.url == "http://example.com/"));
        assert!(matches!(&events[1], CrawlEvent::Failed(f) if !f.timeout));
    }

    #[tokio::test]
    async fn test_shared_cache_spans_crawls() {
        let web = Arc::new(FakeWeb::default().page("http://example.com/", &[]));
        let crawler = crawler(create_test_settings(), web.clone())
            .with_cache(Arc::new(MemoryCache::new()));

        let first = crawler
            .crawl(&["http://example.com/"], CancellationToken::new())
            .await
            .unwrap();
        let second = crawler
            .crawl(&["http://example.com/"], CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(first.results.len(), 1);
        assert!(second.results.is_empty());
        assert_eq!(web.fetched().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_seed_is_rejected() {
        let crawler = crawler(create_test_settings(), Arc::new(FakeWeb::default()));
        let result = crawler
            .crawl(&["ftp://example.com/"], CancellationToken::new())
            .await;
        assert!(matches!(result, Err(CrawlerError::Url(_))));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let result = WebCrawler::with_fetcher(
            CrawlerSettings::new(""),
            Arc::new(FakeWeb::default()),
        );
        assert!(result.is_err());

        let result = WebCrawler::new(
            create_test_settings().with_fetch_timeout(Duration::ZERO),
        );
        assert!(matches!(result, Err(CrawlerError::Config(_))));
    }

    #[test]
    fn test_new_with_defaults() {
        let crawler = WebCrawler::new(CrawlerSettings::default()).unwrap();
        assert_eq!(crawler.settings().concurrency, 8);
        assert_eq!(crawler.settings().max_depth, 16);
    }

    #[test]
    fn test_every_outcome_ends_done() {
        let url = Url::parse("http://example.com/").unwrap();
        let outcomes = vec![
            EntryOutcome::Denied(FrontierEntry::seed(url.clone())),
            EntryOutcome::Abandoned(FrontierEntry::seed(url.clone())),
            EntryOutcome::Parsed(FrontierEntry::seed(url.clone()), Vec::new()),
            EntryOutcome::Failed(
                FrontierEntry::seed(url.clone()),
                FetchError::Timeout {
                    url: url.to_string(),
                },
            ),
        ];

        for outcome in outcomes {
            let reached = outcome.reached();
            assert!(reached.can_transition_to(EntryState::Done) || reached.is_terminal());
            let finished = complete(&outcome.entry().url, reached);
            assert!(finished.is_terminal(), "{:?} did not finish", outcome);
        }
    }

    #[test]
    fn test_idle_deadline_saturates() {
        let now = Instant::now();
        assert!(idle_deadline(now, Duration::MAX) > now);
        assert_eq!(
            idle_deadline(now, Duration::from_secs(1)),
            now + Duration::from_secs(1)
        );
    }
}
