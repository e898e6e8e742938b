//! Statistics computed from a crawl report
//!
//! This module summarizes the aggregated records into counts for the console
//! and the Markdown summary.

use crate::output::traits::CrawlReport;
use crate::state::{CrawlPhase, LinkStatus};
use crate::url::LinkScope;
use std::collections::{BTreeMap, HashSet};

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Terminal phase of the crawl
    pub phase: CrawlPhase,

    /// Number of page records
    pub total_pages: u64,

    /// Page count per fetch status label (`200`, `404`, `blocked`, `ERR`...)
    pub pages_by_status: BTreeMap<String, u64>,

    /// Pages that loaded with a status below 400
    pub successful_pages: u64,

    /// Pages skipped because robots.txt disallowed them
    pub blocked_pages: u64,

    /// Pages the renderer failed to load
    pub failed_pages: u64,

    /// Deepest page recorded
    pub max_depth_reached: u32,

    /// Number of link records
    pub total_links: u64,

    /// Links classified internal
    pub internal_links: u64,

    /// Links classified external
    pub external_links: u64,

    /// Links with status >= 400
    pub broken_links: u64,

    /// Links whose resolution failed (`ERR`)
    pub error_links: u64,

    /// Links dropped by the per-page or total cap
    pub skipped_links: u64,

    /// Links recorded without resolution
    pub unresolved_links: u64,

    /// Distinct target hosts across all links
    pub unique_hosts: u64,
}

impl CrawlStatistics {
    /// Computes statistics from a report
    pub fn from_report(report: &CrawlReport) -> Self {
        let mut stats = CrawlStatistics {
            phase: report.run.phase,
            ..Default::default()
        };

        for page in report.pages() {
            stats.total_pages += 1;
            *stats
                .pages_by_status
                .entry(page.fetch_status.label())
                .or_insert(0) += 1;
            if page.fetch_status.is_success() {
                stats.successful_pages += 1;
            }
            if page.fetch_status.is_blocked() {
                stats.blocked_pages += 1;
            }
            if page.fetch_status.error_detail().is_some() {
                stats.failed_pages += 1;
            }
            stats.max_depth_reached = stats.max_depth_reached.max(page.depth);
        }

        let mut hosts = HashSet::new();
        for link in report.links() {
            stats.total_links += 1;
            match link.scope {
                LinkScope::Internal => stats.internal_links += 1,
                LinkScope::External => stats.external_links += 1,
            }
            match &link.http_status {
                LinkStatus::Status(code) if *code >= 400 => stats.broken_links += 1,
                LinkStatus::Status(_) => {}
                LinkStatus::Error { .. } => stats.error_links += 1,
                LinkStatus::NotResolved => stats.unresolved_links += 1,
                LinkStatus::SkippedPageLimit | LinkStatus::SkippedTotalLimit => {
                    stats.skipped_links += 1
                }
            }
            if let Some(host) = link
                .best_url()
                .and_then(|u| url::Url::parse(u).ok())
                .and_then(|u| u.host_str().map(str::to_lowercase))
            {
                hosts.insert(host);
            }
        }
        stats.unique_hosts = hosts.len() as u64;

        stats
    }

    /// Percentage of pages that loaded with a non-error status
    pub fn page_success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        (self.successful_pages as f64 / self.total_pages as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Phase: {}", stats.phase);
    println!("  Pages recorded: {}", stats.total_pages);
    println!("  Deepest page: {}", stats.max_depth_reached);
    println!("  Links recorded: {}", stats.total_links);
    println!("  Distinct target hosts: {}", stats.unique_hosts);
    println!();

    println!("Pages by Status:");
    let mut status_counts: Vec<_> = stats.pages_by_status.iter().collect();
    status_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (status, count) in status_counts {
        let percentage = if stats.total_pages > 0 {
            (*count as f64 / stats.total_pages as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    println!("Links:");
    println!("  Internal: {}", stats.internal_links);
    println!("  External: {}", stats.external_links);
    println!("  Broken (>= 400): {}", stats.broken_links);
    println!("  ERR: {}", stats.error_links);
    println!("  Not resolved: {}", stats.unresolved_links);
    if stats.skipped_links > 0 {
        println!("  Skipped (link caps): {}", stats.skipped_links);
    }
    println!();

    println!(
        "Success Rate: {:.1}% of {} pages loaded without error",
        stats.page_success_rate(),
        stats.total_pages
    );
}
