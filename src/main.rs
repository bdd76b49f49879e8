//! Polite-Crawler main entry point
//!
//! This is the command-line interface for the Polite-Crawler web crawler.

use anyhow::Context;
use clap::Parser;
use polite_crawler::config::{load_config_with_hash, validate, Config};
use polite_crawler::crawler::Coordinator;
use polite_crawler::output::{print_summary, OutputFormat};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Polite-Crawler: a bounded, polite, concurrent web crawler
///
/// Starting from a seed URL, Polite-Crawler fetches pages with a fixed pool
/// of workers, respects robots.txt, stops at a page ceiling, and writes one
/// record (URL, title, description) per fetched page.
#[derive(Parser, Debug)]
#[command(name = "polite-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A bounded, polite, concurrent web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// URL to start crawling from
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Number of concurrent workers
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Maximum number of pages to admit
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Output file path
    #[arg(long, value_name = "PATH")]
    output: Option<String>,

    /// Output format (csv or jsonl)
    #[arg(long, value_name = "FORMAT")]
    format: Option<OutputFormat>,

    /// Stop the crawl after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(seed) = &self.seed {
            config.crawler.seed_url = seed.clone();
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = max_pages;
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(timeout) = self.timeout {
            config.crawler.crawl_timeout_secs = Some(timeout);
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
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
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
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Polite-Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!("  Workers: {}", config.crawler.workers);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max idle wait: {}ms", config.crawler.max_idle_wait_ms);
    match config.crawler.crawl_timeout_secs {
        Some(secs) => println!("  Crawl timeout: {}s", secs),
        None => println!("  Crawl timeout: none"),
    }

    println!("\nUser Agent:");
    println!("  Header: {}", config.user_agent.header_value());
    println!("  Robots.txt identity: {}", config.user_agent.identity());

    println!("\nHTTP:");
    println!("  Connect timeout: {}s", config.http.connect_timeout_secs);
    println!("  Request timeout: {}s", config.http.request_timeout_secs);
    println!("  Max redirects: {}", config.http.max_redirects);

    println!("\nOutput:");
    println!("  Path: {}", config.output.path);
    println!("  Format: {}", config.output.format);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let output_path = config.output.path.clone();
    let coordinator = Coordinator::from_config(config)
        .with_context(|| format!("Failed to start crawl (output: {})", output_path))?;

    let shutdown = coordinator.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            shutdown.cancel();
        }
    });

    match coordinator.run().await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e).context("Crawl aborted")
        }
    }
}
