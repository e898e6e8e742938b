//! Baseline-vs-upgraded site comparison
//!
//! Crawls the baseline site breadth-first and, for every baseline page,
//! loads the page at the same path on the upgraded site and diffs the links
//! of the two pages.

mod diff;
mod report;

pub use diff::{
    link_compare_key, map_to_upgraded, rebase_onto, DiffCounts, DiffKind, LinkDiff, LinkDiffer,
    NOTE_TARGET_CHANGED, NOTE_UPGRADED_BROKEN,
};
pub use report::format_markdown_diff;

use crate::config::{config_fingerprint, validate, CompareBy, Config};
use crate::crawler::{
    build_http_client, robots_gate, sanitize_text, CancelHandle, CrawlTask, Frontier,
    HttpRenderer, LinkResolver, PageLinks, PageRenderer, PageVisitor, SourcePage, Visit,
    TITLE_MAX,
};
use crate::output::{LinkRecord, RunInfo};
use crate::state::{FetchStatus, Politeness};
use crate::url::{normalize_web_url, NormalizeOptions, NormalizedUrl, ScopeClassifier};
use crate::ConfigError;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Comparison of one baseline page with its upgraded counterpart
#[derive(Debug, Clone)]
pub struct PageComparison {
    /// Position in baseline dequeue order, starting at 1
    pub order: u32,
    pub baseline_url: String,
    pub upgraded_url: String,
    pub baseline_title: String,
    pub upgraded_title: String,
    pub baseline_status: FetchStatus,
    pub upgraded_status: FetchStatus,
    pub counts: DiffCounts,
    pub diffs: Vec<LinkDiff>,
}

/// Everything a compare run produced
#[derive(Debug, Clone)]
pub struct CompareReport {
    /// Run metadata; `start_url` is the baseline seed
    pub run: RunInfo,

    /// Base URL of the upgraded site
    pub upgraded_url: String,

    /// Key the links were matched by
    pub compare_by: CompareBy,

    pub pages: Vec<PageComparison>,
}

impl CompareReport {
    /// Difference counts summed over all pages
    pub fn totals(&self) -> DiffCounts {
        let mut totals = DiffCounts::default();
        for page in &self.pages {
            totals += page.counts;
        }
        totals
    }

    /// Pages with at least one difference
    pub fn pages_with_diffs(&self) -> impl Iterator<Item = &PageComparison> {
        self.pages.iter().filter(|p| !p.diffs.is_empty())
    }
}

/// One side of a page comparison
struct PageSide {
    url: String,
    title: String,
    status: FetchStatus,
    links: Vec<LinkRecord>,
}

impl PageSide {
    fn unloaded(url: &NormalizedUrl, status: FetchStatus) -> Self {
        Self {
            url: url.to_string(),
            title: String::new(),
            status,
            links: Vec::new(),
        }
    }
}

/// Drives a compare run
pub struct Comparator {
    config: Arc<Config>,
    config_hash: String,
    seed: NormalizedUrl,
    upgraded_origin: NormalizedUrl,
    opts: NormalizeOptions,
    baseline_scope: ScopeClassifier,
    upgraded_scope: ScopeClassifier,
    visitor: PageVisitor,
    resolver: LinkResolver,
    frontier: Frontier,
    differ: LinkDiffer,
    pages: Vec<PageComparison>,
    cancel: CancelHandle,
}

impl Comparator {
    /// Creates a comparator
    ///
    /// The baseline URL becomes the crawl seed; crawl limits and scope rules
    /// apply to the baseline crawl. The run-wide link cap is not applied, so
    /// both sides of every page are resolved alike.
    ///
    /// # Returns
    ///
    /// * `Ok(Comparator)` - Ready to run
    /// * `Err(AuditError)` - Missing `[compare]` section, invalid
    ///   configuration or HTTP client failure
    pub fn new(mut config: Config, renderer: Arc<dyn PageRenderer>) -> crate::Result<Self> {
        let compare = config.compare.clone().ok_or_else(|| {
            ConfigError::Validation("compare mode requires a [compare] section".to_string())
        })?;
        config.crawl.start_url = compare.baseline_url.clone();
        validate(&config)?;

        let opts = NormalizeOptions::from_crawl_config(&config.crawl);
        let seed = normalize_web_url(&compare.baseline_url, &opts)?;
        let upgraded_origin = normalize_web_url(&compare.upgraded_url, &opts)?;
        let baseline_scope = ScopeClassifier::from_config(&seed, &config.crawl)?;
        let upgraded_scope = match upgraded_origin.host() {
            Some(host) => baseline_scope.with_seed_host(host),
            None => baseline_scope.clone(),
        };
        let client = build_http_client(&config.network, &config.user_agent)?;
        let config_hash = config_fingerprint(&config)?;

        let visitor = PageVisitor::new(
            renderer,
            robots_gate(&config, &client),
            Politeness::new(Duration::from_millis(config.crawl.delay_ms)),
        );
        let resolver = LinkResolver::new(&config, client)
            .with_screenshots(false)
            .without_total_limit();
        let differ = LinkDiffer::new(compare.compare_by, resolver.resolves_links());
        if differ.compare_by() != compare.compare_by {
            tracing::info!("Link resolution is off; comparing by absolute URL");
        }
        let frontier = Frontier::new(
            seed.clone(),
            config.crawl.max_pages,
            config.crawl.max_depth,
        );

        Ok(Self {
            config: Arc::new(config),
            config_hash,
            seed,
            upgraded_origin,
            opts,
            baseline_scope,
            upgraded_scope,
            visitor,
            resolver,
            frontier,
            differ,
            pages: Vec::new(),
            cancel: CancelHandle::new(),
        })
    }

    /// Uses an existing cancel handle
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle that stops this run
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Runs the comparison
    pub async fn run(mut self) -> crate::Result<CompareReport> {
        let started_at = Utc::now();
        tracing::info!(
            "Comparing {} against {} (max {} pages, depth {})",
            self.seed,
            self.upgraded_origin,
            self.config.crawl.max_pages,
            self.config.crawl.max_depth
        );

        let start_time = Instant::now();
        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Compare cancelled");
                self.frontier.cancel();
                break;
            }

            let Some(task) = self.frontier.next_task() else {
                break;
            };
            self.compare_task(task).await;
        }

        let phase = self.frontier.phase();
        let report = CompareReport {
            run: RunInfo {
                start_url: self.seed.to_string(),
                phase,
                started_at,
                finished_at: Utc::now(),
                config_hash: self.config_hash,
            },
            upgraded_url: self.upgraded_origin.to_string(),
            compare_by: self.differ.compare_by(),
            pages: self.pages,
        };

        let totals = report.totals();
        tracing::info!(
            "Compare finished ({}): {} pages, {} missing, {} extra, {} wrong in {:?}",
            phase,
            report.pages.len(),
            totals.missing,
            totals.extra,
            totals.wrong,
            start_time.elapsed()
        );
        Ok(report)
    }

    async fn compare_task(&mut self, task: CrawlTask) {
        let order = self.pages.len() as u32 + 1;
        tracing::debug!("Comparing page {} (depth {}): {}", order, task.depth, task.url);

        let baseline = self.capture_baseline(&task).await;

        let comparison = if baseline.status.is_blocked() {
            PageComparison {
                order,
                baseline_url: baseline.url,
                upgraded_url: String::new(),
                baseline_title: String::new(),
                upgraded_title: String::new(),
                baseline_status: baseline.status,
                upgraded_status: FetchStatus::Unverified,
                counts: DiffCounts::default(),
                diffs: Vec::new(),
            }
        } else {
            let mut upgraded = self.capture_upgraded(&baseline.url).await;
            rebase_onto(
                &mut upgraded.links,
                self.upgraded_origin.as_url(),
                self.seed.as_url(),
            );
            let (diffs, counts) = self.differ.compare(&baseline.links, &upgraded.links);
            if counts.total() > 0 {
                tracing::info!(
                    "{}: {} missing, {} extra, {} wrong",
                    upgraded.url,
                    counts.missing,
                    counts.extra,
                    counts.wrong
                );
            }
            PageComparison {
                order,
                baseline_url: baseline.url,
                upgraded_url: upgraded.url,
                baseline_title: baseline.title,
                upgraded_title: upgraded.title,
                baseline_status: baseline.status,
                upgraded_status: upgraded.status,
                counts,
                diffs,
            }
        };
        self.pages.push(comparison);
    }

    async fn capture_baseline(&mut self, task: &CrawlTask) -> PageSide {
        let side = match self.visitor.visit(&task.url).await {
            Visit::Blocked => return PageSide::unloaded(&task.url, FetchStatus::Blocked),
            Visit::Failed(e) => PageSide::unloaded(&task.url, FetchStatus::Error(e.reason())),
            Visit::Loaded(rendered) => {
                if let Ok(landing) = normalize_web_url(rendered.final_url.as_str(), &self.opts) {
                    self.frontier.mark_visited(&landing);
                }
                let title = sanitize_text(&rendered.title, TITLE_MAX);
                let links = self
                    .resolver
                    .resolve_page(
                        SourcePage {
                            url: &rendered.final_url,
                            title: &title,
                        },
                        &rendered.anchors,
                        &self.baseline_scope,
                    )
                    .await;
                for candidate in links.candidates() {
                    self.frontier.offer(candidate, task.depth);
                }
                PageSide {
                    url: rendered.final_url.to_string(),
                    title,
                    status: rendered.fetch_status,
                    links: links.into_records(),
                }
            }
        };
        self.visitor.finish(&task.url);
        side
    }

    async fn capture_upgraded(&mut self, baseline_url: &str) -> PageSide {
        let mapped = match ::url::Url::parse(baseline_url) {
            Ok(page) => map_to_upgraded(
                &page,
                self.upgraded_origin.as_url(),
                self.opts.keep_query,
            ),
            Err(_) => self.upgraded_origin.as_url().clone(),
        };
        let url = match normalize_web_url(mapped.as_str(), &self.opts) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot map {} to the upgraded site: {}", baseline_url, e);
                return PageSide {
                    url: mapped.to_string(),
                    title: String::new(),
                    status: FetchStatus::Error(e.to_string()),
                    links: Vec::new(),
                };
            }
        };

        let side = match self.visitor.visit(&url).await {
            Visit::Blocked => return PageSide::unloaded(&url, FetchStatus::Blocked),
            Visit::Failed(e) => PageSide::unloaded(&url, FetchStatus::Error(e.reason())),
            Visit::Loaded(rendered) => {
                let title = sanitize_text(&rendered.title, TITLE_MAX);
                let links: PageLinks = self
                    .resolver
                    .resolve_page(
                        SourcePage {
                            url: &rendered.final_url,
                            title: &title,
                        },
                        &rendered.anchors,
                        &self.upgraded_scope,
                    )
                    .await;
                PageSide {
                    url: rendered.final_url.to_string(),
                    title,
                    status: rendered.fetch_status,
                    links: links.into_records(),
                }
            }
        };
        self.visitor.finish(&url);
        side
    }
}

/// Runs a complete comparison with the built-in static-HTML renderer
pub async fn run_compare(config: Config) -> crate::Result<CompareReport> {
    let client = build_http_client(&config.network, &config.user_agent)?;
    let renderer = Arc::new(HttpRenderer::new(client));
    Comparator::new(config, renderer)?.run().await
}
