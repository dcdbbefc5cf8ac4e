//! Fathom main entry point
//!
//! Command-line interface for the fathom crawler:
//! `fathom URL [DEPTH [DOWNLOADERS [EXTRACTORS [PER_HOST]]]]`

use anyhow::Context;
use clap::Parser;
use fathom::config::{load_config, Config};
use fathom::{Crawler, HttpDownloader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Fathom: a depth-bounded concurrent web crawler
///
/// Crawls the link graph reachable from URL, layer by layer, up to DEPTH
/// layers, bounding concurrent downloads globally and per origin host.
/// Prints the downloaded URLs followed by every failure with its cause.
#[derive(Parser, Debug)]
#[command(name = "fathom")]
#[command(version)]
#[command(about = "A depth-bounded concurrent web crawler", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Number of layers to crawl (default 1)
    #[arg(value_name = "DEPTH")]
    depth: Option<String>,

    /// Maximum concurrent downloads (default 1)
    #[arg(value_name = "DOWNLOADERS")]
    downloaders: Option<String>,

    /// Maximum concurrent link extractions (default 1)
    #[arg(value_name = "EXTRACTORS")]
    extractors: Option<String>,

    /// Maximum concurrent downloads per host (default 2)
    #[arg(value_name = "PER_HOST")]
    per_host: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // File config provides the baseline; positional arguments override it.
    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    let depth = parse_or(cli.depth.as_deref(), 1);
    let downloaders = parse_limit_or(cli.downloaders.as_deref(), config.crawler.downloaders);
    let extractors = parse_limit_or(cli.extractors.as_deref(), config.crawler.extractors);
    let per_host = parse_limit_or(cli.per_host.as_deref(), config.crawler.per_host);

    tracing::info!(
        url = %cli.url,
        depth,
        downloaders,
        extractors,
        per_host,
        "starting fathom"
    );

    let downloader =
        HttpDownloader::new(&config.http).context("failed to build the HTTP client")?;
    let crawler = Crawler::new(Arc::new(downloader), downloaders, extractors, per_host);

    let report = crawler.crawl(&cli.url, depth).await;

    println!("Downloaded URLs:");
    for url in &report.downloaded {
        println!("{url}");
    }

    println!("Errors:");
    for (url, cause) in &report.errors {
        println!("{url}: {cause}");
    }

    crawler.close().await;

    Ok(())
}

/// Parses a positional integer argument, falling back to `default` when the
/// argument is absent or not a valid integer.
fn parse_or(arg: Option<&str>, default: usize) -> usize {
    arg.and_then(|s| s.parse().ok()).unwrap_or(default)
}

/// Like [`parse_or`], but for pool limits, which must be at least 1.
fn parse_limit_or(arg: Option<&str>, default: usize) -> usize {
    arg.and_then(|s| s.parse().ok())
        .filter(|v| *v >= 1)
        .unwrap_or(default)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fathom=info,warn"),
            1 => EnvFilter::new("fathom=debug,info"),
            2 => EnvFilter::new("fathom=trace,debug"),
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
