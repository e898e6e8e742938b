//! Site-Link-Audit main entry point
//!
//! This is the command-line interface for the Site-Link-Audit link crawler.

use anyhow::{bail, Context};
use clap::Parser;
use site_link_audit::compare::{Comparator, CompareReport};
use site_link_audit::config::{read_config, validate, CompareBy, CompareConfig, Config};
use site_link_audit::crawler::{build_http_client, HttpRenderer};
use site_link_audit::output::{
    print_statistics, CrawlReport, CrawlStatistics, MarkdownReportWriter, ReportWriter,
    SqliteReportWriter,
};
use site_link_audit::{CancelHandle, Coordinator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Site-Link-Audit: a bounded link-graph crawler
///
/// Crawls a site breadth-first from a start URL within page, depth and
/// domain limits, records every link it finds with its resolved status, and
/// writes a SQLite report plus a Markdown summary.
#[derive(Parser, Debug)]
#[command(name = "site-link-audit")]
#[command(version)]
#[command(about = "A bounded link-graph crawler for link audits", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the configuration and show what would be crawled
    #[arg(long)]
    dry_run: bool,

    /// Seed URL
    #[arg(long)]
    start_url: Option<String>,

    /// Maximum number of pages to crawl
    #[arg(long)]
    max_pages: Option<u32>,

    /// Maximum links resolved per page
    #[arg(long)]
    max_links_per_page: Option<u32>,

    /// Maximum links resolved across the run
    #[arg(long)]
    max_total_links: Option<u32>,

    /// Maximum crawl depth (the seed is depth 0)
    #[arg(long)]
    max_depth: Option<u32>,

    /// Per-host delay between page fetches, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Follow links to other hosts too
    #[arg(long)]
    all_domains: bool,

    /// Treat subdomains of the seed host as internal
    #[arg(long)]
    include_subdomains: bool,

    /// Keep query strings when normalizing URLs
    #[arg(long)]
    keep_query: bool,

    /// Drop tracking parameters from kept query strings
    #[arg(long)]
    strip_tracking_params: bool,

    /// Record fragment links and keep fragments as distinct targets
    #[arg(long)]
    include_fragments: bool,

    /// Only crawl URLs matching this regex (case-insensitive)
    #[arg(long)]
    pattern_include: Option<String>,

    /// Never crawl URLs matching this regex (case-insensitive)
    #[arg(long)]
    pattern_exclude: Option<String>,

    /// Open the seed and wait for Enter before crawling
    #[arg(long)]
    pause_on_first: bool,

    /// Network timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Maximum redirect hops per link
    #[arg(long)]
    max_redirects: Option<u32>,

    /// Ignore robots.txt
    #[arg(long)]
    ignore_robots: bool,

    /// Record links without resolving them over HTTP
    #[arg(long)]
    no_resolve: bool,

    /// Capture link screenshots (needs a screenshot-capable renderer)
    #[arg(long)]
    screenshots: bool,

    /// Path of the SQLite report
    #[arg(long, value_name = "PATH")]
    database: Option<String>,

    /// Path of the Markdown summary
    #[arg(long, value_name = "PATH")]
    summary: Option<String>,

    /// Compare mode: baseline (old) site URL
    #[arg(long, requires = "upgraded_url")]
    baseline_url: Option<String>,

    /// Compare mode: upgraded (new) site URL
    #[arg(long, requires = "baseline_url")]
    upgraded_url: Option<String>,

    /// Compare mode: key links are matched by
    #[arg(long, value_parser = ["final-url", "absolute-url"])]
    compare_by: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let cancel = CancelHandle::new();
    spawn_ctrl_c_handler(cancel.clone());

    if config.compare.is_some() {
        handle_compare(config, cancel).await
    } else {
        handle_crawl(config, cancel).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_link_audit=info,warn"),
            1 => EnvFilter::new("site_link_audit=debug,info"),
            2 => EnvFilter::new("site_link_audit=trace,debug"),
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

/// Loads the configuration file (if any), applies flags and validates
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            read_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None if cli.start_url.is_some() || cli.baseline_url.is_some() => Config::default(),
        None => bail!("either a CONFIG file, --start-url or --baseline-url is required"),
    };

    apply_overrides(&mut config, cli);

    if let Some(compare) = &config.compare {
        if config.crawl.start_url.is_empty() {
            config.crawl.start_url = compare.baseline_url.clone();
        }
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    let crawl = &mut config.crawl;
    if let Some(url) = &cli.start_url {
        crawl.start_url = url.clone();
    }
    if let Some(n) = cli.max_pages {
        crawl.max_pages = n;
    }
    if let Some(n) = cli.max_links_per_page {
        crawl.max_links_per_page = n;
    }
    if let Some(n) = cli.max_total_links {
        crawl.max_total_links = n;
    }
    if let Some(n) = cli.max_depth {
        crawl.max_depth = n;
    }
    if let Some(ms) = cli.delay_ms {
        crawl.delay_ms = ms;
    }
    if cli.all_domains {
        crawl.same_domain_only = false;
    }
    crawl.include_subdomains |= cli.include_subdomains;
    crawl.keep_query |= cli.keep_query;
    crawl.strip_tracking_params |= cli.strip_tracking_params;
    crawl.include_fragments |= cli.include_fragments;
    if cli.pattern_include.is_some() {
        crawl.pattern_include = cli.pattern_include.clone();
    }
    if cli.pattern_exclude.is_some() {
        crawl.pattern_exclude = cli.pattern_exclude.clone();
    }
    crawl.pause_on_first |= cli.pause_on_first;

    let network = &mut config.network;
    if let Some(ms) = cli.timeout_ms {
        network.timeout_ms = ms;
    }
    if let Some(n) = cli.max_redirects {
        network.max_redirects = n;
    }
    if cli.ignore_robots {
        network.respect_robots = false;
    }
    if cli.no_resolve {
        network.resolve_links = false;
    }

    let output = &mut config.output;
    output.screenshots |= cli.screenshots;
    if let Some(path) = &cli.database {
        output.database_path = path.clone();
    }
    if let Some(path) = &cli.summary {
        output.summary_path = path.clone();
    }

    if let (Some(baseline), Some(upgraded)) = (&cli.baseline_url, &cli.upgraded_url) {
        config.compare = Some(CompareConfig {
            baseline_url: baseline.clone(),
            upgraded_url: upgraded.clone(),
            compare_by: CompareBy::default(),
        });
    }
    if let (Some(compare), Some(by)) = (config.compare.as_mut(), cli.compare_by.as_deref()) {
        compare.compare_by = match by {
            "absolute-url" => CompareBy::AbsoluteUrl,
            _ => CompareBy::FinalUrl,
        };
    }
}

/// Stops the run after the current page on Ctrl-C
fn spawn_ctrl_c_handler(cancel: CancelHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; finishing the current page");
            cancel.cancel();
        }
    });
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Site-Link-Audit Dry Run ===\n");

    let crawl = &config.crawl;
    println!("Crawl:");
    println!("  Start URL: {}", crawl.start_url);
    println!("  Max pages: {}", crawl.max_pages);
    println!("  Max depth: {}", crawl.max_depth);
    println!("  Max links per page: {}", crawl.max_links_per_page);
    println!("  Max total links: {}", crawl.max_total_links);
    println!("  Delay: {}ms", crawl.delay_ms);
    println!("  Same domain only: {}", crawl.same_domain_only);
    println!("  Include subdomains: {}", crawl.include_subdomains);
    println!("  Keep query: {}", crawl.keep_query);
    println!("  Include fragments: {}", crawl.include_fragments);
    if let Some(pattern) = &crawl.pattern_include {
        println!("  Include pattern: {}", pattern);
    }
    if let Some(pattern) = &crawl.pattern_exclude {
        println!("  Exclude pattern: {}", pattern);
    }

    println!("\nNetwork:");
    println!("  Timeout: {}ms", config.network.timeout_ms);
    println!("  Max redirects: {}", config.network.max_redirects);
    println!("  Respect robots.txt: {}", config.network.respect_robots);
    println!("  Resolve links: {}", config.network.resolve_links);
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    if let Some(compare) = &config.compare {
        println!("\nCompare:");
        println!("  Baseline: {}", compare.baseline_url);
        println!("  Upgraded: {}", compare.upgraded_url);
        println!("  Compare by: {:?}", compare.compare_by);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, cancel: CancelHandle) -> anyhow::Result<()> {
    if config.output.screenshots {
        tracing::warn!("The built-in renderer cannot capture screenshots; none will be stored");
    }

    let client = build_http_client(&config.network, &config.user_agent)
        .context("failed to build HTTP client")?;
    let renderer = Arc::new(HttpRenderer::new(client));
    let database = SqliteReportWriter::new(&config.output.database_path);
    let summary = MarkdownReportWriter::new(&config.output.summary_path);

    let report: CrawlReport = Coordinator::new(config, renderer)?
        .with_cancel_handle(cancel)
        .run()
        .await
        .context("crawl failed")?;

    database
        .write(&report)
        .with_context(|| format!("failed to write {}", database.path().display()))?;
    summary
        .write(&report)
        .with_context(|| format!("failed to write {}", summary.path().display()))?;

    print_statistics(&CrawlStatistics::from_report(&report));
    if report.run.is_partial() {
        println!("\nThe crawl stopped early ({}); the report is partial.", report.run.phase);
    }
    Ok(())
}

/// Handles compare mode
async fn handle_compare(config: Config, cancel: CancelHandle) -> anyhow::Result<()> {
    let client = build_http_client(&config.network, &config.user_agent)
        .context("failed to build HTTP client")?;
    let renderer = Arc::new(HttpRenderer::new(client));
    let database = SqliteReportWriter::new(&config.output.database_path);
    let summary = MarkdownReportWriter::new(&config.output.summary_path);

    let report: CompareReport = Comparator::new(config, renderer)?
        .with_cancel_handle(cancel)
        .run()
        .await
        .context("compare failed")?;

    database
        .write(&report)
        .with_context(|| format!("failed to write {}", database.path().display()))?;
    summary
        .write(&report)
        .with_context(|| format!("failed to write {}", summary.path().display()))?;

    let totals = report.totals();
    println!("=== Compare Results ===\n");
    println!("  Pages compared: {}", report.pages.len());
    println!("  Missing links: {}", totals.missing);
    println!("  Extra links: {}", totals.extra);
    println!("  Wrong links: {}", totals.wrong);
    if report.run.is_partial() {
        println!("\nThe run stopped early ({}); the report is partial.", report.run.phase);
    }
    Ok(())
}
