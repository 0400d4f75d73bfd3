//! Listing Harvester main entry point
//!
//! This is the command-line interface for the catalog crawler.

use clap::Parser;
use listing_harvester::config::{
    load_config_with_hash, Config, CrawlJob, JobOverrides, PaginationStrategy, RendererKind,
};
use listing_harvester::crawler::run_crawl;
use listing_harvester::output::print_statistics;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Listing Harvester: a paginated real-estate catalog crawler
///
/// Renders each catalog page in a disposable headless browser, extracts the
/// apartment listings, and writes them as JSON lines in page order.
#[derive(Parser, Debug)]
#[command(name = "listing-harvester")]
#[command(version)]
#[command(about = "A paginated real-estate catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Catalog area to crawl (see --list-areas)
    #[arg(short, long)]
    area: Option<String>,

    /// Crawl this base catalog URL instead of a configured area
    #[arg(long, value_name = "URL", conflicts_with = "area")]
    url: Option<String>,

    /// Crawl exactly this many pages instead of stopping at the first empty page
    #[arg(short, long, value_name = "N")]
    pages: Option<u32>,

    /// Maximum number of pages rendered at once (fixed page count only)
    #[arg(short, long, value_name = "K")]
    concurrency: Option<u32>,

    /// Output JSON-lines file
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// How pages are rendered
    #[arg(long, value_enum)]
    renderer: Option<RendererKind>,

    /// Print the configured catalog areas and exit
    #[arg(long, conflicts_with = "dry_run")]
    list_areas: bool,

    /// Resolve and print the crawl job without crawling
    #[arg(long)]
    dry_run: bool,

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

    let (config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path).map_err(|e| {
                tracing::error!("Failed to load configuration: {}", e);
                e
            })?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => {
            tracing::info!("No configuration file given, using built-in defaults");
            (Config::default(), None)
        }
    };

    if cli.list_areas {
        handle_list_areas(&config);
        return Ok(());
    }

    let overrides = JobOverrides {
        area: cli.area.clone(),
        base_url: cli.url.clone(),
        pages: cli.pages,
        concurrency: cli.concurrency,
        output: cli.output.clone(),
        renderer: cli.renderer,
    };
    let job = CrawlJob::from_config(&config, &overrides)?;

    if cli.dry_run {
        handle_dry_run(&job);
        return Ok(());
    }

    handle_crawl(&config, job, config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvester=info,warn"),
            1 => EnvFilter::new("listing_harvester=debug,info"),
            2 => EnvFilter::new("listing_harvester=trace,debug"),
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

/// Handles --list-areas
fn handle_list_areas(config: &Config) {
    println!("Catalog areas ({}):", config.catalog.areas.len());
    for (name, url) in &config.catalog.areas {
        let marker = if *name == config.catalog.area { "*" } else { " " };
        println!(" {} {}  {}", marker, name, url);
    }
}

/// Handles --dry-run: shows what would be crawled
fn handle_dry_run(job: &CrawlJob) {
    println!("=== Listing Harvester Dry Run ===\n");

    println!("Catalog:");
    if let Some(area) = &job.area {
        println!("  Area: {}", area);
    }
    println!("  Base URL: {}", job.base_url);
    println!("  Renderer: {:?}", job.renderer);

    println!("\nPagination:");
    match job.strategy {
        PaginationStrategy::Unbounded => {
            println!("  Until the first empty page (sequential)");
            println!(
                "  Give up after {} consecutive failed pages",
                job.max_consecutive_failures
            );
        }
        PaginationStrategy::Fixed(n) => {
            println!("  Pages 1..={} over {} workers", n, job.concurrency);
        }
    }

    println!("\nPacing:");
    println!(
        "  Settle: {}..{}ms",
        job.pacing.settle.min_ms, job.pacing.settle.max_ms
    );
    println!(
        "  Cooldown: {}..{}ms",
        job.pacing.cooldown.min_ms, job.pacing.cooldown.max_ms
    );
    println!("  Page-load timeout: {}ms", job.page_load_timeout.as_millis());

    println!("\nOutput: {}", job.output_path.display());
    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    job: CrawlJob,
    config_hash: Option<String>,
) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    // Ctrl-C stops issuing pages; collected records are still written
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing with pages collected so far");
            on_interrupt.cancel();
        }
    });

    match run_crawl(config, job, cancel).await {
        Ok(mut report) => {
            report.config_hash = config_hash;
            tracing::info!("Scraping completed");
            print_statistics(&report.statistics());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
