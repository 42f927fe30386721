//! Gleaner main entry point
//!
//! Command-line interface for the article harvester: run a crawl, query
//! the snapshot, inspect storage, or validate configuration.

use anyhow::Context;
use clap::Parser;
use gleaner::config::load_config_with_hash;
use gleaner::model::ArticleQuery;
use gleaner::storage::{ArticleStore, JsonStore};
use gleaner::{Config, NewsService};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gleaner: an incremental article harvester
///
/// Gleaner walks a paginated article listing, extracts each article into
/// typed content blocks, skips everything it has seen before, and keeps
/// a queryable JSON-backed snapshot up to date.
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version = "1.0.0")]
#[command(about = "An incremental article harvester", long_about = None)]
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

    /// Override the configured page cap for this run
    #[arg(long)]
    max_pages: Option<u32>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "query"])]
    dry_run: bool,

    /// Show statistics from the article file and exit
    #[arg(long, conflicts_with_all = ["dry_run", "query"])]
    stats: bool,

    /// Query the article snapshot and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    query: bool,

    /// Filter by exact category (with --query)
    #[arg(long)]
    category: Option<String>,

    /// Case-insensitive search over title and summary (with --query)
    #[arg(long)]
    search: Option<String>,

    /// Page number (with --query)
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Page size (with --query)
    #[arg(long, default_value_t = 20)]
    page_size: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.query {
        handle_query(&cli, config)?;
    } else {
        handle_crawl(config, cli.max_pages).await?;
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gleaner=info,warn"),
            1 => EnvFilter::new("gleaner=debug,info"),
            2 => EnvFilter::new("gleaner=trace,debug"),
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

/// Handles --dry-run: validates config and shows the effective settings
fn handle_dry_run(config: &Config) {
    println!("=== Gleaner Dry Run ===\n");

    println!("Source:");
    println!("  Name: {}", config.source.name);
    println!("  Category: {}", config.source.category);
    println!("  Listing: {}", config.source.base_url);
    println!("  Content selector: {}", config.source.content_selector);

    println!("\nCrawler:");
    println!("  Floor identifier: {}", config.crawler.min_article_id);
    match config.crawler.max_pages {
        Some(max) => println!("  Max pages: {max}"),
        None => println!("  Max pages: unbounded"),
    }
    println!("  Batch size: {}", config.crawler.batch_size);
    println!("  Retry attempts: {}", config.crawler.retry_attempts);
    println!(
        "  Selector timeout: {}ms",
        config.crawler.selector_timeout_ms
    );
    println!("  Crawl workers: {}", config.crawler.crawl_workers);

    println!("\nOutput:");
    println!("  Article file: {}", config.output.data_path);

    println!("\n✓ Configuration is valid");
}

/// Handles --stats: summarizes the durable article file
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let store = JsonStore::new(&config.output.data_path);
    let articles = store.load_all().context("failed to read article file")?;

    println!("Article file: {}\n", config.output.data_path);
    println!("Total articles: {}", articles.len());

    if articles.is_empty() {
        return Ok(());
    }

    let mut by_category: BTreeMap<&str, usize> = BTreeMap::new();
    for article in &articles {
        *by_category.entry(article.category.as_str()).or_default() += 1;
    }
    println!("\nBy category:");
    for (category, count) in by_category {
        println!("  {category}: {count}");
    }

    let mut dates: Vec<&str> = articles.iter().map(|a| a.date.as_str()).collect();
    dates.sort_unstable();
    println!("\nDate range: {} .. {}", dates[0], dates[dates.len() - 1]);

    Ok(())
}

/// Handles --query: loads the snapshot and prints one result page
fn handle_query(cli: &Cli, config: Config) -> anyhow::Result<()> {
    let service = NewsService::new(config);
    service.load_existing()?;

    let page = service
        .query(&ArticleQuery {
            page: cli.page,
            page_size: cli.page_size,
            category: cli.category.clone(),
            search: cli.search.clone(),
        })
        .context("query failed")?;

    for article in &page.articles {
        println!("{}  {}  {}", article.date, article.id, article.title);
    }
    println!(
        "\npage {}/{} ({} total, next: {}, prev: {})",
        page.page,
        page.total.div_ceil(page.page_size.max(1)).max(1),
        page.total,
        page.has_next,
        page.has_prev
    );

    Ok(())
}

/// Handles the default mode: run a crawl to completion
///
/// Ctrl-C interrupts the run; fetched work is flushed before exit.
async fn handle_crawl(config: Config, max_pages: Option<u32>) -> anyhow::Result<()> {
    let service = NewsService::new(config);

    let loaded = service.load_existing()?;
    tracing::info!(loaded, "existing articles loaded");

    let handle = service.trigger_crawl(max_pages);
    let stopper = handle.stopper();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing current batch");
            stopper.interrupt();
        }
    });

    match handle.wait().await {
        Some(report) => {
            let status = service.status();
            println!("Crawl finished: {:?}", report.stop);
            println!("  Pages visited: {}", report.pages_visited);
            println!("  Articles ingested: {}", report.ingested);
            println!("  Articles skipped: {}", report.skipped);
            println!("  Snapshot size: {}", status.count);
            Ok(())
        }
        None => {
            let status = service.status();
            anyhow::bail!(
                "crawl aborted: {}",
                status
                    .error_message
                    .unwrap_or_else(|| "unknown error".to_string())
            )
        }
    }
}
