//! Sumi-Sift main entry point
//!
//! This is the command-line interface for the Sumi-Sift sitemap sifter.

use clap::Parser;
use std::path::{Path, PathBuf};
use sumi_sift::config::{load_config_with_hash, Config};
use sumi_sift::crawler::{Coordinator, DiscoveryReport};
use sumi_sift::output::{
    generate_markdown_summary, generate_summary, load_statistics, print_statistics,
};
use sumi_sift::storage::open_storage;
use sumi_sift::url::seeds_from_config;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sumi-Sift: a sitemap sifter
///
/// Sumi-Sift walks a site's XML sitemaps, however deeply nested, and records
/// every declared URL exactly once in a resumable SQLite ledger. It can then
/// retrieve the cleaned text of the discovered pages.
#[derive(Parser, Debug)]
#[command(name = "sumi-sift")]
#[command(version = "1.0.0")]
#[command(about = "Recursive sitemap discovery with a deduplicating ledger", long_about = None)]
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

    /// Retrieve and store the text of discovered pages after discovery
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "export_summary"])]
    retrieve: bool,

    /// Validate config and show the seeds without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Generate markdown summary from existing data and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else {
        handle_discover(config, &config_hash, cli.retrieve).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_sift=info,warn"),
            1 => EnvFilter::new("sumi_sift=debug,info"),
            2 => EnvFilter::new("sumi_sift=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the seeds
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Sumi-Sift Dry Run ===\n");

    println!("Discovery Configuration:");
    println!("  Base URL: {}", config.discovery.base_url);
    println!(
        "  Max concurrent fetches: {}",
        config.discovery.max_concurrent_fetches
    );
    println!("  Fetch timeout: {}ms", config.discovery.fetch_timeout_ms);
    match config.discovery.max_depth {
        Some(depth) => println!("  Max depth: {}", depth),
        None => println!("  Max depth: unlimited"),
    }

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\nRetrieval:");
    println!(
        "  Max concurrent pages: {}",
        config.retrieval.max_concurrent_pages
    );
    println!("  Preview length: {} chars", config.retrieval.preview_chars);

    let seeds = seeds_from_config(&config.discovery)?;
    println!("\nSeed Sitemaps ({}):", seeds.len());
    for seed in &seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start discovery from {} seed sitemaps", seeds.len());

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Exporting Discovery Summary ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let storage = open_storage(Path::new(&config.output.database_path))?;

    tracing::info!("Loading discovery data from database...");
    let summary = generate_summary(&storage)?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Handles the main discovery operation
async fn handle_discover(
    config: Config,
    config_hash: &str,
    retrieve: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary_path = PathBuf::from(&config.output.summary_path);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let mut coordinator = Coordinator::new(config, config_hash)?;
    tracing::info!("Seed sitemaps: {}", coordinator.seeds().len());

    let report = match coordinator.run(cancel.clone()).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Discovery failed: {}", e);
            return Err(e.into());
        }
    };

    print_report(&report);

    if retrieve && !report.cancelled {
        let retrieval = coordinator.retrieve(&report.pages, cancel).await?;
        println!(
            "Retrieved text for {} pages ({} failed)",
            retrieval.retrieved, retrieval.failed
        );
    }

    let summary = generate_summary(coordinator.storage())?;
    generate_markdown_summary(&summary, &summary_path)?;
    tracing::info!("Summary written to {}", summary_path.display());

    Ok(())
}

fn print_report(report: &DiscoveryReport) {
    if report.cancelled {
        println!("Discovery interrupted; partial results below.\n");
    }

    println!("Sitemaps visited: {}", report.sitemaps_visited.len());
    println!(
        "Sitemaps fetched: {} ({} failed, {} replayed from the ledger)",
        report.stats.sitemaps_fetched, report.stats.failed_fetches, report.stats.replayed
    );
    println!(
        "New records: {} ({} already known)",
        report.stats.inserted, report.stats.duplicates
    );
    println!("Found {} URLs in total", report.pages.len());
}
