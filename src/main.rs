//! Polite Crawler main entry point
//!
//! This is the command-line interface for the polite crawler.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use polite_crawler::config::{load_config_with_hash, validate, Config, CrawlerSettings};
use polite_crawler::output::{
    print_statistics, CrawlReport, CrawlStatistics, JsonLinesOutput, OutputError, OutputHandler,
};
use polite_crawler::url::parse_seed;
use polite_crawler::WebCrawler;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Polite Crawler: a depth-bounded, robots-aware web crawler
///
/// Crawls each seed's domain while respecting robots.txt and pacing requests,
/// and writes one JSON object per fetched page: {"url": ..., "links": [...]}.
#[derive(Parser, Debug)]
#[command(name = "polite-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A polite, depth-bounded web crawler", long_about = None)]
struct Cli {
    /// Seed URLs to start crawling from
    #[arg(value_name = "URL", required = true)]
    seeds: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Write results to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Also write failed fetches to the output
    #[arg(long)]
    include_failures: bool,

    /// Print crawl statistics to stderr when done
    #[arg(long)]
    stats: bool,

    /// User agent to crawl as
    #[arg(long)]
    user_agent: Option<String>,

    /// Maximum link depth from a seed (0 = unlimited)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Maximum concurrent fetches (0 = unbounded)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Timeout of a single fetch, in milliseconds
    #[arg(long)]
    fetch_timeout_ms: Option<u64>,

    /// Stop after this long without a successful fetch, in milliseconds
    #[arg(long)]
    crawl_timeout_ms: Option<u64>,

    /// Base delay between requests to a domain, in milliseconds
    #[arg(long)]
    politeness_delay_ms: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        let crawler = &mut config.crawler;
        if let Some(user_agent) = &self.user_agent {
            crawler.user_agent = user_agent.clone();
        }
        if let Some(max_depth) = self.max_depth {
            crawler.max_depth = max_depth;
        }
        if let Some(concurrency) = self.concurrency {
            crawler.concurrency = concurrency;
        }
        if let Some(timeout) = self.fetch_timeout_ms {
            crawler.fetch_timeout_ms = timeout;
        }
        if let Some(timeout) = self.crawl_timeout_ms {
            crawler.crawl_timeout_ms = timeout;
        }
        if let Some(delay) = self.politeness_delay_ms {
            crawler.politeness_delay_ms = delay;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    let seeds = cli
        .seeds
        .iter()
        .map(|seed| parse_seed(seed).with_context(|| format!("Invalid seed URL: {}", seed)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let settings = CrawlerSettings::from(&config.crawler);
    let crawler = WebCrawler::new(settings).context("Failed to create crawler")?;

    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout()),
    };
    let mut output = JsonLinesOutput::new(writer).with_failures(cli.include_failures);

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let report = handle_crawl(&crawler, &seeds, cancel, &mut output).await?;

    if cli.stats {
        print_statistics(&CrawlStatistics::from_report(&report));
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("polite_crawler=info,warn"),
            1 => EnvFilter::new("polite_crawler=debug,info"),
            2 => EnvFilter::new("polite_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Cancels the crawl on the first Ctrl-C or SIGTERM
fn spawn_interrupt_handler(cancel: CancellationToken) {
    let mut signals = match ShutdownSignals::new() {
        Ok(signals) => signals,
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signals: {}", e);
            return;
        }
    };

    tokio::spawn(async move {
        match signals.recv().await {
            Ok(name) => {
                tracing::warn!("Received {}, finishing in-flight requests", name);
                cancel.cancel();
            }
            Err(e) => tracing::error!("Failed waiting for shutdown signals: {}", e),
        }
    });
}

/// Signals that stop a crawl
///
/// Handlers are installed on creation, so a signal arriving before `recv`
/// is polled is still seen.
struct ShutdownSignals {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    fn new() -> io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            terminate: tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?,
        })
    }

    /// Waits for the first signal and returns its name
    #[cfg(unix)]
    async fn recv(&mut self) -> io::Result<&'static str> {
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|()| "Ctrl-C"),
            _ = self.terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> io::Result<&'static str> {
        tokio::signal::ctrl_c().await.map(|()| "Ctrl-C")
    }
}

/// Handles the main crawl operation, writing results as they arrive
async fn handle_crawl(
    crawler: &WebCrawler,
    seeds: &[url::Url],
    cancel: CancellationToken,
    output: &mut dyn OutputHandler,
) -> anyhow::Result<CrawlReport> {
    tracing::info!("Total seed URLs: {}", seeds.len());

    let mut report = CrawlReport::new(Utc::now());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let writer = async {
        while let Some(event) = rx.recv().await {
            output.record_event(&event)?;
            report.record(event);
        }
        Ok::<(), OutputError>(())
    };

    let (stop_reason, written) = tokio::join!(crawler.run(seeds, cancel, tx), writer);
    written.context("Failed to write results")?;

    output
        .finalize(stop_reason)
        .context("Failed to finish writing results")?;
    report.finish(stop_reason);

    tracing::info!(
        "Crawl completed ({}): {} pages, {} failures",
        stop_reason,
        report.results.len(),
        report.failures.len()
    );
    Ok(report)
}
