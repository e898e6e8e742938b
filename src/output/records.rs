//! Page and link records produced by a crawl

use crate::state::{CrawlPhase, FetchStatus, LinkStatus};
use crate::url::LinkScope;
use chrono::{DateTime, Utc};

/// One row of the crawl summary: a dequeued page
///
/// Created once per dequeued page, whether or not the page loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    /// Position in dequeue order, starting at 1
    pub order: u32,

    /// The crawl task URL (normalized)
    pub url: String,

    /// Where the page landed after redirects, if it loaded
    pub final_url: Option<String>,

    /// Page title (empty if unavailable)
    pub title: String,

    /// Outcome of loading the page
    pub fetch_status: FetchStatus,

    /// Number of link records captured from the page
    pub link_count: usize,

    /// Crawl depth (the seed is depth 0)
    pub depth: u32,
}

/// One row of the links sheet: a single anchor occurrence
///
/// Duplicate anchors on a page each get their own record.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    /// URL of the page the anchor was found on
    pub source_url: String,

    /// Title of that page
    pub source_title: String,

    /// Whitespace-collapsed anchor text (or aria-label)
    pub link_text: String,

    /// The `href` attribute as written
    pub raw_href: String,

    /// Normalized absolute URL; `None` when the href is malformed
    pub absolute_url: Option<String>,

    /// Post-redirect URL; `None` when not resolved
    pub resolved_url: Option<String>,

    /// Resolution outcome
    pub http_status: LinkStatus,

    /// The `target` attribute
    pub target: String,

    /// The `rel` attribute
    pub rel: String,

    /// Internal/External, judged on the resolved URL
    pub scope: LinkScope,

    /// Cropped PNG of the anchor element
    pub screenshot: Option<Vec<u8>>,
}

impl LinkRecord {
    /// Returns the resolved URL, falling back to the absolute URL
    pub fn best_url(&self) -> Option<&str> {
        self.resolved_url
            .as_deref()
            .or(self.absolute_url.as_deref())
    }
}

/// Metadata about one run
#[derive(Debug, Clone)]
pub struct RunInfo {
    /// Seed URL (the baseline URL in compare mode)
    pub start_url: String,

    /// Terminal phase of the frontier
    pub phase: CrawlPhase,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished
    pub finished_at: DateTime<Utc>,

    /// Fingerprint of the effective configuration
    pub config_hash: String,
}

impl RunInfo {
    /// Returns the run duration in whole seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds().max(0)
    }

    /// Returns true if the run stopped before the frontier ran dry
    pub fn is_partial(&self) -> bool {
        matches!(self.phase, CrawlPhase::LimitReached | CrawlPhase::Cancelled)
    }
}
