//! Crawlbox main entry point
//!
//! This is the command-line interface for the crawlbox crawler.

use anyhow::{Context, Result};
use clap::Parser;
use crawlbox::config::load_config_with_hash;
use crawlbox::crawler::read_url_list;
use crawlbox::Crawler;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Crawlbox: a breadth-first crawler with a persistent frontier
///
/// Crawlbox enumerates every page reachable inside a base URL, or downloads
/// and archives a list of pages. Progress lives in the frontier, so an
/// interrupted run picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "crawlbox")]
#[command(version)]
#[command(about = "A breadth-first crawler with a persistent frontier", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Download and archive the URLs listed in this file instead of crawling
    #[arg(long, value_name = "URL_FILE", conflicts_with = "dump")]
    download: Option<PathBuf>,

    /// Write the known links of the scope to a file and exit
    #[arg(long)]
    dump: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    // Setup logging based on verbosity
    let verbose = if config.crawl.verbose {
        cli.verbose.max(2)
    } else {
        cli.verbose
    };
    setup_logging(verbose, cli.quiet);

    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    let crawler = Crawler::new(config)
        .await
        .context("Failed to start the crawler")?;
    tracing::info!("Frontier database: {}", crawler.name());

    if cli.dump {
        let path = crawler.dump().await.context("Failed to export links")?;
        println!("Wrote links to {}", path.display());
    } else if let Some(url_file) = cli.download {
        let urls = read_url_list(&url_file)
            .with_context(|| format!("Failed to read URL file {}", url_file.display()))?;
        tracing::info!("Downloading {} URLs from {}", urls.len(), url_file.display());
        crawler.download(&urls).await.context("Download failed")?;
    } else {
        crawler.crawl().await.context("Crawl failed")?;
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
            0 => EnvFilter::new("crawlbox=info,warn"),
            1 => EnvFilter::new("crawlbox=debug,info"),
            2 => EnvFilter::new("crawlbox=trace,debug"),
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
