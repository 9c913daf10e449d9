//! Review-Harvest main entry point
//!
//! This is the command-line interface for the Review-Harvest listing crawler.

use clap::{Parser, ValueEnum};
use review_harvest::config::{
    load_config_with_hash, validate, validate_target_url, Config, FilterConfig, RendererBackend,
};
use review_harvest::crawler::{crawl, CrawlReport, StopReason};
use review_harvest::output::{print_statistics, save_reviews, OutputFormat};
use review_harvest::render::{HttpRenderer, WebDriverRenderer};
use review_harvest::url::with_star_filter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Review-Harvest: a polite review-listing harvester
///
/// Review-Harvest walks the numbered pages of a review listing, extracts every review
/// into a structured record, and stops on its own when the listing runs out.
#[derive(Parser, Debug)]
#[command(name = "review-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite review-listing harvester", long_about = None)]
struct Cli {
    /// Review listing URL to crawl
    #[arg(value_name = "URL")]
    url: String,

    /// Output file; the extension is adjusted to the format
    #[arg(short, long, default_value = "reviews.json")]
    output: PathBuf,

    /// Output format: json (structured) or csv (tabular)
    #[arg(short, long, default_value = "json")]
    format: String,

    /// Only keep reviews with these star ratings (1-5)
    #[arg(short, long, num_args = 1.., value_parser = clap::value_parser!(u8).range(1..=5))]
    stars: Vec<u8>,

    /// Stop after this many pages
    #[arg(short = 'p', long = "max-pages", value_name = "N")]
    max_pages: Option<u32>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Rendering backend
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// WebDriver server address
    #[arg(long, value_name = "URL")]
    webdriver_url: Option<String>,

    /// Seconds to wait for review content on each page
    #[arg(long, value_name = "SECONDS")]
    page_load_timeout: Option<f64>,

    /// Seconds between load attempts of the same page
    #[arg(long, value_name = "SECONDS")]
    retry_delay: Option<f64>,

    /// Seconds between successive pages
    #[arg(long, value_name = "SECONDS")]
    page_delay: Option<f64>,

    /// Load attempts per page
    #[arg(long, value_name = "N")]
    max_retries: Option<u32>,

    /// Debug logging and save the first page's markup
    #[arg(long)]
    debug: bool,

    /// Where --debug saves the first page's markup
    #[arg(long, value_name = "PATH")]
    debug_html_path: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Webdriver,
    Http,
}

impl From<BackendArg> for RendererBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Webdriver => RendererBackend::WebDriver,
            BackendArg::Http => RendererBackend::Http,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let verbose = if cli.debug { cli.verbose.max(1) } else { cli.verbose };
    setup_logging(verbose, cli.quiet);

    // Load configuration, then layer the command line on top
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli);
    validate(&config)?;

    let format: OutputFormat = cli.format.parse()?;
    let target = validate_target_url(&cli.url)?;
    let base_url = with_star_filter(&target, &config.filter.stars);

    let report = match handle_crawl(config, &base_url).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Could not start rendering session: {}", e);
            return Err(e.into());
        }
    };

    if matches!(report.stop_reason, StopReason::SessionLost { .. }) {
        tracing::warn!("Saving the reviews collected before the session was lost");
    }
    if report.reviews.is_empty() {
        tracing::warn!("No reviews were extracted");
    }
    let written = save_reviews(&report.reviews, &cli.output, format)?;

    if !cli.quiet {
        println!();
        print_statistics(&report);
        println!("\n✓ {} reviews saved to: {}", report.total_reviews(), written.display());
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
            0 => EnvFilter::new("review_harvest=info,warn"),
            1 => EnvFilter::new("review_harvest=debug,info"),
            2 => EnvFilter::new("review_harvest=trace,debug"),
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

fn seconds_to_ms(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0).round() as u64
}

/// Applies command-line flags over the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if !cli.stars.is_empty() {
        let mut stars = cli.stars.clone();
        stars.sort_unstable();
        stars.dedup();
        config.filter = FilterConfig::new(stars);
    }
    if let Some(pages) = cli.max_pages {
        config.crawler.max_pages = Some(pages);
    }
    if let Some(backend) = cli.backend {
        config.renderer.backend = backend.into();
    }
    if let Some(url) = &cli.webdriver_url {
        config.renderer.webdriver_url = url.clone();
    }
    if let Some(seconds) = cli.page_load_timeout {
        config.crawler.page_load_timeout_ms = seconds_to_ms(seconds);
    }
    if let Some(seconds) = cli.retry_delay {
        config.crawler.retry_delay_ms = seconds_to_ms(seconds);
    }
    if let Some(seconds) = cli.page_delay {
        config.crawler.page_delay_ms = seconds_to_ms(seconds);
    }
    if let Some(retries) = cli.max_retries {
        config.crawler.max_retries = retries;
    }
    if cli.debug {
        config.debug.save_html = true;
    }
    if let Some(path) = &cli.debug_html_path {
        config.debug.html_path = path.clone();
    }
}

/// Opens the configured rendering session and runs the crawl over it
///
/// Only a session that cannot be opened at all is an error.
async fn handle_crawl(config: Config, base_url: &Url) -> review_harvest::Result<CrawlReport> {
    tracing::info!("Target: {}", base_url);
    if config.filter.is_active() {
        tracing::info!("Keeping only {:?}-star reviews", config.filter.stars);
    }
    if let Some(pages) = config.crawler.max_pages {
        tracing::info!("Crawling at most {} pages", pages);
    }

    match config.renderer.backend {
        RendererBackend::WebDriver => {
            let renderer = WebDriverRenderer::connect(&config.renderer).await?;
            Ok(crawl(config, renderer, base_url).await)
        }
        RendererBackend::Http => {
            let renderer = HttpRenderer::new(&config.renderer)?;
            Ok(crawl(config, renderer, base_url).await)
        }
    }
}
