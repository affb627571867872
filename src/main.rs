//! Meta-Crawl main entry point
//!
//! This is the command-line interface for the Meta-Crawl page metadata crawler.

use anyhow::Context;
use clap::Parser;
use meta_crawl::config::{load_config, validate, Config, FetchMode};
use meta_crawl::crawler::{BrowserFetcher, CrawlEngine, HttpFetcher, PageFetcher};
use meta_crawl::output::{print_statistics, CrawlStatistics, ResultSink};
use meta_crawl::url::{normalize_absolute, CrawlTarget};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Meta-Crawl: collect the title and description of every page on a site
///
/// Meta-Crawl walks every page reachable from the seed URL without leaving
/// its host, and writes one CSV row (url, title, description) per page.
/// Interrupting the crawl still writes everything collected so far.
#[derive(Parser, Debug)]
#[command(name = "meta-crawl")]
#[command(version = "1.0.0")]
#[command(about = "Crawl a single site and export page titles and descriptions to CSV", long_about = None)]
struct Cli {
    /// Seed URL, including the http:// or https:// scheme
    #[arg(value_name = "SEED_URL")]
    seed: String,

    /// Output CSV path (default: <host>.csv in the current directory)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Minimum seconds between fetch starts
    #[arg(short, long, value_name = "SECONDS")]
    delay: Option<f64>,

    /// Render pages in a headless browser before extracting metadata
    #[arg(long)]
    render: bool,

    /// Show the browser window (rendered mode only)
    #[arg(long, requires = "render")]
    no_headless: bool,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
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

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    // Reject a bad seed before touching the filesystem or launching anything
    let seed = normalize_absolute(&cli.seed)
        .with_context(|| format!("invalid seed URL {:?}", cli.seed))?;
    let target = CrawlTarget::from_seed(&seed)
        .with_context(|| format!("invalid seed URL {:?}", cli.seed))?;

    let output_path = config
        .output
        .path
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| target.default_output_path());

    let sink = ResultSink::create(&output_path)?.with_bom(config.output.bom);
    tracing::info!("Writing results to {}", output_path.display());

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let delay = config.crawler.delay();
    let stats = match config.crawler.mode {
        FetchMode::Static => {
            let fetcher = HttpFetcher::from_config(&config.crawler, &config.user_agent)
                .context("failed to build HTTP client")?;
            run_crawl(seed.as_str(), fetcher, delay, sink, cancel).await?
        }
        FetchMode::Rendered => {
            let fetcher = BrowserFetcher::launch(&config.crawler, &config.browser)
                .await
                .context("failed to launch headless browser")?;
            run_crawl(seed.as_str(), fetcher, delay, sink, cancel).await?
        }
    };

    if !cli.quiet {
        print_statistics(&stats);
        println!("\nResults written to {}", output_path.display());
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG`, when set, takes precedence over the flags.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            // Only show errors
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("meta_crawl=info,warn"),
                1 => EnvFilter::new("meta_crawl=debug,info"),
                2 => EnvFilter::new("meta_crawl=trace,debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Layers defaults, the optional config file and command-line flags
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(output) = &cli.output {
        config.output.path = Some(output.to_string_lossy().into_owned());
    }
    if let Some(delay) = cli.delay {
        config.crawler.delay = Some(delay);
    }
    if cli.render {
        config.crawler.mode = FetchMode::Rendered;
    }
    if cli.no_headless {
        config.browser.headless = false;
    }

    // Flags can introduce values the file never had
    validate(&config).context("invalid configuration")?;

    Ok(config)
}

/// Runs a complete crawl with the chosen fetcher
async fn run_crawl<F: PageFetcher>(
    seed: &str,
    fetcher: F,
    delay: Duration,
    sink: ResultSink,
    cancel: CancellationToken,
) -> anyhow::Result<CrawlStatistics> {
    let mut engine = CrawlEngine::new(seed, fetcher, delay, sink)?;

    match engine.run(cancel).await {
        Ok(stats) => Ok(stats),
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Cancels `cancel` on the first SIGINT/SIGTERM and exits on the second
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = wait_for_signal().await {
            tracing::warn!("Could not install signal handler: {}", e);
            return;
        }
        tracing::warn!("Interrupt received, stopping after the current page (repeat to force exit)");
        cancel.cancel();

        if wait_for_signal().await.is_ok() {
            tracing::error!("Second interrupt received, exiting without saving");
            std::process::exit(130);
        }
    });
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
