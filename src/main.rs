//! Lemma-Search main entry point
//!
//! This is the command-line interface for the Lemma-Search crawler and
//! search engine.

use anyhow::Context;
use clap::{Parser, Subcommand};
use lemma_search::config::{load_config_with_hash, Config};
use lemma_search::crawler::SiteOutcome;
use lemma_search::{Engine, IndexPageOutcome, StopOutcome};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Lemma-Search: a lemma-based site search engine
///
/// Lemma-Search crawls the configured sites, indexes their Russian-language
/// content by lemma and answers free-text queries with ranked, highlighted
/// results.
#[derive(Parser, Debug)]
#[command(name = "lemma-search")]
#[command(version = "1.0.0")]
#[command(about = "A lemma-based site search engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl and index every configured site (Ctrl-C stops the crawl)
    Crawl,

    /// Fetch and (re-)index a single page of a configured site
    IndexUrl {
        /// Absolute URL of the page
        url: String,
    },

    /// Search the index
    Search {
        /// Free-text query
        query: String,

        /// Only search this configured site
        #[arg(long)]
        site: Option<String>,

        /// Number of results to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Maximum number of results to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Validate the configuration and print it
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    match cli.command {
        Command::CheckConfig => handle_check_config(&config),
        Command::Crawl => handle_crawl(config).await,
        Command::IndexUrl { url } => handle_index_url(config, &url).await,
        Command::Search {
            query,
            site,
            offset,
            limit,
        } => handle_search(config, &query, site.as_deref(), offset, limit),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lemma_search=info,warn"),
            1 => EnvFilter::new("lemma_search=debug,info"),
            2 => EnvFilter::new("lemma_search=trace,debug"),
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

/// Handles `check-config`: shows the effective configuration
fn handle_check_config(config: &Config) -> anyhow::Result<()> {
    println!("=== Lemma-Search Configuration ===\n");

    let crawler = &config.crawler;
    println!("Crawler:");
    match crawler.fetch_workers {
        Some(workers) => println!("  Fetch workers: {}", workers),
        None => println!("  Fetch workers: auto"),
    }
    println!("  Request timeout: {}s", crawler.request_timeout_secs);
    println!("  Site time budget: {}s", crawler.site_time_budget_secs);
    println!(
        "  Batch size: {} (comfortable below {})",
        crawler.batch_size, crawler.comfortable_batch_size
    );
    println!(
        "  Fetch delay: {}ms initial, {}ms floor, +{}ms / -{}ms",
        crawler.initial_fetch_delay_ms,
        crawler.min_fetch_delay_ms,
        crawler.delay_increase_step_ms,
        crawler.delay_decrease_step_ms
    );

    println!("\nSearch:");
    println!("  Word rank limit: {}", config.search.word_rank_limit);
    println!("  Snippet interval: {}", config.search.snippet_interval);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nMorphology:");
    if let Some(path) = &config.morphology.dictionary_path {
        println!("  Dictionary: {}", path);
    }

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        println!("  - {} ({})", site.name, site.url);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles `crawl`: runs a full crawl in the foreground
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!("Sites to crawl: {}", config.sites.len());
    let engine = Engine::from_config(config).context("Failed to initialize engine")?;

    engine.start_crawl();

    let report = tokio::select! {
        report = engine.wait_for_crawl() => report,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received, stopping crawl");
            if engine.stop_crawl().await == StopOutcome::NotRunning {
                tracing::info!("Crawl had already finished");
            }
            return Ok(());
        }
    };

    let Some(report) = report else {
        return Ok(());
    };
    let report = report.context("Crawl failed")?;

    println!("\n=== Crawl Summary ===\n");
    for (site, outcome) in &report.sites {
        match outcome {
            SiteOutcome::Indexed { pages } => println!("  {}: indexed {} pages", site, pages),
            SiteOutcome::Stopped => println!("  {}: stopped", site),
            SiteOutcome::Failed(reason) => println!("  {}: failed ({})", site, reason),
        }
    }
    println!("\nTotal pages: {}", report.total_pages());

    Ok(())
}

/// Handles `index-url`: indexes a single page
async fn handle_index_url(config: Config, url: &str) -> anyhow::Result<()> {
    let engine = Engine::from_config(config).context("Failed to initialize engine")?;

    match engine.index_single_url(url).await? {
        IndexPageOutcome::Success => println!("✓ Indexed {}", url),
        IndexPageOutcome::OutOfScope => {
            anyhow::bail!("{} is outside of the configured sites", url)
        }
        IndexPageOutcome::FetchFailed => anyhow::bail!("Could not fetch {}", url),
    }

    Ok(())
}

/// Handles `search`: prints one page of results
fn handle_search(
    config: Config,
    query: &str,
    site: Option<&str>,
    offset: usize,
    limit: usize,
) -> anyhow::Result<()> {
    let engine = Engine::from_config(config).context("Failed to initialize engine")?;
    let response = engine.search(query, site, offset, limit)?;

    println!("Found {} pages for \"{}\"\n", response.total_count, query);
    for (i, result) in response.results.iter().enumerate() {
        println!(
            "{}. {} [{}{}] relevance {:.3}",
            offset + i + 1,
            if result.page_title.is_empty() {
                &result.page_path
            } else {
                &result.page_title
            },
            result.site_url.trim_end_matches('/'),
            result.page_path,
            result.relevance
        );
        println!("   {}\n", result.snippet);
    }

    Ok(())
}
