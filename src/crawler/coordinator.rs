//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop, which:
//! - Dequeues pages from the frontier in BFS order
//! - Visits each page (robots check, politeness delay, render)
//! - Resolves the page's anchors and records page + link rows together
//! - Feeds crawl-eligible links back to the frontier
//! - Stops on exhaustion, limits or cancellation

use crate::config::{config_fingerprint, validate, Config};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::parser::{sanitize_text, TITLE_MAX};
use crate::crawler::renderer::{
    HttpRenderer, PageRenderer, RenderedPage, ScreenshotCapturer, SessionGate, StdinGate,
};
use crate::crawler::resolver::{LinkResolver, SourcePage};
use crate::crawler::scheduler::{CrawlTask, Frontier};
use crate::crawler::visitor::{PageVisitor, Visit};
use crate::output::{CrawlReport, PageRecord, ReportAggregator, RunInfo};
use crate::robots::RobotsGate;
use crate::state::{FetchStatus, Politeness};
use crate::url::{normalize_web_url, NormalizeOptions, NormalizedUrl, ScopeClassifier};
use chrono::Utc;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Stops a running crawl from another task
///
/// The crawl checks the handle between pages, so a page and its links are
/// always recorded together.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the crawl to stop after the current page
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Builds the robots gate the configuration asks for
pub(crate) fn robots_gate(config: &Config, client: &Client) -> RobotsGate {
    if config.network.respect_robots {
        RobotsGate::new(client.clone(), config.user_agent.crawler_name.clone())
    } else {
        RobotsGate::disabled()
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    config_hash: String,
    seed: NormalizedUrl,
    opts: NormalizeOptions,
    scope: ScopeClassifier,
    visitor: PageVisitor,
    resolver: LinkResolver,
    frontier: Frontier,
    records: ReportAggregator,
    gate: Arc<dyn SessionGate>,
    cancel: CancelHandle,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl configuration (validated here)
    /// * `renderer` - Loads pages and reports their anchors
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(AuditError)` - Invalid configuration or HTTP client failure
    pub fn new(config: Config, renderer: Arc<dyn PageRenderer>) -> crate::Result<Self> {
        validate(&config)?;

        let opts = NormalizeOptions::from_crawl_config(&config.crawl);
        let seed = normalize_web_url(&config.crawl.start_url, &opts)?;
        let scope = ScopeClassifier::from_config(&seed, &config.crawl)?;
        let client = build_http_client(&config.network, &config.user_agent)?;
        let config_hash = config_fingerprint(&config)?;

        let visitor = PageVisitor::new(
            renderer,
            robots_gate(&config, &client),
            Politeness::new(Duration::from_millis(config.crawl.delay_ms)),
        );
        let resolver = LinkResolver::new(&config, client);
        let frontier = Frontier::new(
            seed.clone(),
            config.crawl.max_pages,
            config.crawl.max_depth,
        );

        Ok(Self {
            config: Arc::new(config),
            config_hash,
            seed,
            opts,
            scope,
            visitor,
            resolver,
            frontier,
            records: ReportAggregator::new(),
            gate: Arc::new(StdinGate),
            cancel: CancelHandle::new(),
        })
    }

    /// Uses the given screenshot capturer for link screenshots
    pub fn with_capturer(mut self, capturer: Arc<dyn ScreenshotCapturer>) -> Self {
        self.resolver = self.resolver.with_capturer(capturer);
        self
    }

    /// Uses the given gate for pause-on-first
    pub fn with_session_gate(mut self, gate: Arc<dyn SessionGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Uses an existing cancel handle
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle that stops this crawl
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Runs the main crawl loop
    ///
    /// Per-page and per-link failures are recorded, never returned; the
    /// report covers everything crawled before the loop stopped.
    pub async fn run(mut self) -> crate::Result<CrawlReport> {
        let started_at = Utc::now();
        tracing::info!(
            "Starting crawl of {} (max {} pages, depth {})",
            self.seed,
            self.config.crawl.max_pages,
            self.config.crawl.max_depth
        );

        if self.config.crawl.pause_on_first {
            self.open_session().await?;
        }

        let start_time = Instant::now();
        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Crawl cancelled");
                self.frontier.cancel();
                break;
            }

            let Some(task) = self.frontier.next_task() else {
                break;
            };
            self.process_task(task).await?;

            if self.resolver.total_limit_reached() {
                tracing::info!(
                    "Total link limit of {} reached",
                    self.config.crawl.max_total_links
                );
                self.frontier.limit_reached();
            }

            let pages = self.frontier.pages_dequeued();
            if pages % 10 == 0 {
                let rate = pages as f64 / start_time.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                    pages,
                    self.frontier.len(),
                    rate
                );
            }
        }

        tracing::info!(
            "Crawl finished ({}): {} pages, {} links in {:?}",
            self.frontier.phase(),
            self.records.pages().len(),
            self.records.links().len(),
            start_time.elapsed()
        );

        Ok(CrawlReport {
            run: RunInfo {
                start_url: self.seed.to_string(),
                phase: self.frontier.phase(),
                started_at,
                finished_at: Utc::now(),
                config_hash: self.config_hash,
            },
            records: self.records,
        })
    }

    /// Opens the seed for the operator and waits for confirmation
    ///
    /// If the session lands elsewhere, the landing URL replaces the seed and
    /// becomes the scope anchor.
    async fn open_session(&mut self) -> crate::Result<()> {
        let landing = match self.visitor.renderer().open_session(self.seed.as_url()).await {
            Ok(landing) => landing,
            Err(e) => {
                tracing::warn!("Could not open session on {}: {}", self.seed, e);
                self.seed.as_url().clone()
            }
        };

        self.gate.confirm(&landing).await?;

        match normalize_web_url(landing.as_str(), &self.opts) {
            Ok(landing) if landing.without_fragment() != self.seed => {
                tracing::info!("Session landed on {}; crawling from there", landing);
                if let Some(host) = landing.host() {
                    self.scope = self.scope.with_seed_host(host);
                }
                self.frontier.reseed(landing.clone());
                self.seed = landing.without_fragment();
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Ignoring session landing URL {}: {}", landing, e),
        }
        Ok(())
    }

    /// Processes a single page
    ///
    /// This method:
    /// 1. Visits the page (robots, politeness, render)
    /// 2. Resolves its anchors
    /// 3. Offers crawl-eligible links to the frontier
    /// 4. Records the page and its links in one step
    async fn process_task(&mut self, task: CrawlTask) -> crate::Result<()> {
        let order = self.records.next_order();
        tracing::debug!("Processing page {} (depth {}): {}", order, task.depth, task.url);

        let mut page = PageRecord {
            order,
            url: task.url.to_string(),
            final_url: None,
            title: String::new(),
            fetch_status: FetchStatus::Blocked,
            link_count: 0,
            depth: task.depth,
        };

        match self.visitor.visit(&task.url).await {
            Visit::Blocked => {
                self.records.add_page(page)?;
                return Ok(());
            }
            Visit::Failed(e) => {
                page.fetch_status = FetchStatus::Error(e.reason());
                self.records.add_page(page)?;
            }
            Visit::Loaded(rendered) => {
                let links = self.extract_links(&task, &rendered).await;
                page.final_url = Some(rendered.final_url.to_string());
                page.title = sanitize_text(&rendered.title, TITLE_MAX);
                page.fetch_status = rendered.fetch_status;
                page.link_count = links.len();
                self.records.add_page_with_links(page, links)?;
            }
        }

        self.visitor.finish(&task.url);
        Ok(())
    }

    async fn extract_links(
        &mut self,
        task: &CrawlTask,
        rendered: &RenderedPage,
    ) -> Vec<crate::output::LinkRecord> {
        if let Ok(landing) = normalize_web_url(rendered.final_url.as_str(), &self.opts) {
            if self.frontier.mark_visited(&landing) {
                tracing::debug!("Redirected: {} -> {}", task.url, landing);
            }
        }

        let title = sanitize_text(&rendered.title, TITLE_MAX);
        let source = SourcePage {
            url: &rendered.final_url,
            title: &title,
        };
        let links = self
            .resolver
            .resolve_page(source, &rendered.anchors, &self.scope)
            .await;

        for candidate in links.candidates() {
            self.frontier.offer(candidate, task.depth);
        }

        links.into_records()
    }
}

/// Runs a complete crawl with the built-in static-HTML renderer
///
/// # Arguments
///
/// * `config` - The crawl configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Records of everything crawled
/// * `Err(AuditError)` - Invalid configuration or client setup failure
pub async fn run_crawl(config: Config) -> crate::Result<CrawlReport> {
    let client = build_http_client(&config.network, &config.user_agent)?;
    let renderer = Arc::new(HttpRenderer::new(client));
    Coordinator::new(config, renderer)?.run().await
}
