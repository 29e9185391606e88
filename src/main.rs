//! Cepage main entry point
//!
//! Command-line interface for the cepage compendium harvester.

use cepage::config::load_config;
use cepage::retry::RetryPolicy;
use cepage::url::origin_of;
use cepage::{Authenticator, Crawler, JsonLinesSink};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Cepage: a compendium harvester for session-gated wine references
///
/// Cepage logs into a session-gated reference site, walks its nested
/// appellation hierarchy breadth-first, and writes the structured
/// compendium record of every leaf page to a JSON-lines file.
#[derive(Parser, Debug)]
#[command(name = "cepage")]
#[command(version)]
#[command(about = "A compendium harvester for session-gated wine references", long_about = None)]
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

    /// Validate config and show what would be harvested without logging in
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_harvest(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cepage=info,warn"),
            1 => EnvFilter::new("cepage=debug,info"),
            2 => EnvFilter::new("cepage=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &cepage::Config) {
    println!("=== Cepage Dry Run ===\n");

    println!("Site:");
    println!("  Base URL:  {}", config.site.base_url);
    println!("  Login URL: {}", config.site.login_url);
    println!("  Start URL: {}", config.site.start_url);

    println!("\nCredentials:");
    println!("  Username: {}", config.credentials.username);

    println!("\nCrawler:");
    println!("  Max retries per operation: {}", config.crawler.max_retries);
    println!(
        "  Inter-request delay: {}ms to {}ms",
        config.crawler.min_delay_ms, config.crawler.max_delay_ms
    );
    match config.crawler.max_pages {
        Some(budget) => println!("  Node budget: {}", budget),
        None => println!("  Node budget: unlimited"),
    }

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);

    println!("\n✓ Configuration is valid");
    println!("✓ Would log in and walk the hierarchy from {}", config.site.start_url);
}

/// Handles the main harvest operation: login, walk, report
async fn handle_harvest(config: cepage::Config) -> anyhow::Result<()> {
    let cancel = Arc::new(AtomicBool::new(false));

    // First Ctrl-C requests a graceful stop; records already written stay
    // on disk.
    let cancel_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing current node and stopping");
            cancel_flag.store(true, Ordering::Relaxed);
        }
    });

    let retry = RetryPolicy::new(
        config.crawler.max_retries,
        Duration::from_millis(config.crawler.retry_base_ms),
        cancel.clone(),
    );

    let base_origin = origin_of(&config.site.base_url)?;
    let authenticator = Authenticator::new(
        &config.site.login_url,
        base_origin,
        config.credentials.clone(),
    );

    tracing::info!("Logging in as {}", config.credentials.username);
    let session = match authenticator.login(&retry).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Authentication failed: {}", e);
            return Err(e.into());
        }
    };

    let sink = JsonLinesSink::create(Path::new(&config.output.records_path))?;
    let mut crawler = Crawler::new(session, &config.crawler, sink, cancel);

    match crawler.crawl(&config.site.start_url).await {
        Ok(stats) => {
            println!(
                "Harvest complete: {} nodes visited, {} records written to {}, {} skipped",
                stats.visited, stats.records, config.output.records_path, stats.skipped
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
