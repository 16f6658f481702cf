//! Quote-Harvest main entry point
//!
//! This is the command-line interface for the Quote-Harvest crawler.

use anyhow::Context;
use clap::Parser;
use quote_harvest::config::{load_config_with_hash, Config};
use quote_harvest::crawler::crawl;
use quote_harvest::output::generate_report;
use quote_harvest::storage::clear_output_dir;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Quote-Harvest: an authenticated, paginated quote crawler
///
/// Logs into the configured quotes site, follows its "next page" chain,
/// writes every page's quotes to a JSON file as it goes and finishes with a
/// data-quality report.
#[derive(Parser, Debug)]
#[command(name = "quote-harvest")]
#[command(version)]
#[command(about = "An authenticated, paginated quote crawler", long_about = None)]
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

    /// Keep output from the previous run instead of clearing it
    #[arg(long)]
    append: bool,

    /// Do not generate the QA report after crawling
    #[arg(long)]
    skip_report: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "report_only")]
    dry_run: bool,

    /// Regenerate the QA report from existing data and exit
    #[arg(long, conflicts_with = "dry_run")]
    report_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    // Clear before logging starts so a log file inside the output directory survives
    let crawling = !cli.dry_run && !cli.report_only;
    let cleared = if crawling && !cli.append {
        Some(clear_previous_output(&config)?)
    } else {
        None
    };

    setup_logging(cli.verbose, cli.quiet, config.output.log_path.as_deref())?;
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );
    if let Some(count) = cleared {
        tracing::info!("Cleared {} entries left by the last run", count);
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.report_only {
        handle_report(&config)?;
    } else {
        handle_crawl(config, cli.skip_report).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stdout, or to `log_path` (appended, without colors) when set.
fn setup_logging(verbose: u8, quiet: bool, log_path: Option<&str>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("quote_harvest=info,warn"),
            1 => EnvFilter::new("quote_harvest=debug,info"),
            2 => EnvFilter::new("quote_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match log_path {
        Some(path) => {
            let path = Path::new(path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.init(),
    }

    Ok(())
}

/// Deletes everything in the directory holding the dataset
fn clear_previous_output(config: &Config) -> anyhow::Result<usize> {
    let data_path = Path::new(&config.output.data_path);
    let Some(dir) = data_path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        // Never wipe the working directory
        return Ok(0);
    };

    clear_output_dir(dir).with_context(|| format!("Failed to clear {}", dir.display()))
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Quote-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Username: {}", config.site.username);
    println!("  Login path: {}", config.site.login_path);
    println!("  CSRF field: {}", config.site.csrf_field);
    println!("  Logged-in marker: {}", config.site.logged_in_marker);
    println!("  Review site: {}", config.site.review_site_domain);

    println!("\nHTTP:");
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  User agent: {}", config.http.user_agent);

    println!("\nRetry:");
    println!("  Max retries: {}", config.retry.max_retries);
    println!(
        "  Backoff: {}ms .. {}ms",
        config.retry.base_delay_ms, config.retry.max_delay_ms
    );
    println!(
        "  Rate-limit backoff: {}ms .. {}ms",
        config.retry.rate_limit_initial_ms, config.retry.rate_limit_max_ms
    );
    println!(
        "  Page delay: {}ms .. {}ms",
        config.retry.page_delay_min_ms, config.retry.page_delay_max_ms
    );

    println!("\nSelectors:");
    println!("  Quote: {}", config.selectors.quote);
    println!("  Next page: {}", config.selectors.next_page);

    println!("\nOutput:");
    println!("  Data: {}", config.output.data_path);
    println!("  Report: {}", config.output.report_path);
    if let Some(log_path) = &config.output.log_path {
        println!("  Log: {}", log_path);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling at {}", config.site.base_url);
}

/// Handles the --report-only mode and the report step after a crawl
fn handle_report(config: &Config) -> anyhow::Result<()> {
    let summary = generate_report(
        Path::new(&config.output.data_path),
        Path::new(&config.output.report_path),
    )
    .context("QA report failed")?;

    println!(
        "✓ QA report written to {} ({}/{} valid records)",
        config.output.report_path, summary.valid_records, summary.total_records
    );
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, skip_report: bool) -> anyhow::Result<()> {
    let data_path = PathBuf::from(&config.output.data_path);

    let report = match crawl(config.clone()).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    tracing::info!(
        "Crawl finished in state {} ({}): {} pages, {} quotes",
        report.state,
        report.stop_reason,
        report.pages_scraped,
        report.quotes_collected
    );

    match std::fs::metadata(&data_path) {
        Ok(meta) => tracing::info!(
            "Output file size: {:.2} KB",
            meta.len() as f64 / 1024.0
        ),
        Err(e) => tracing::warn!("Output file {} not found: {}", data_path.display(), e),
    }

    if skip_report {
        return Ok(());
    }
    handle_report(&config)
}
