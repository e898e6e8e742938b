//! Markdown summary generation
//!
//! This module writes a human-readable summary of a crawl: run information,
//! totals, a page table and the list of broken links.

use crate::output::stats::CrawlStatistics;
use crate::output::traits::{CrawlReport, OutputResult, ReportWriter};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes the Markdown summary file
#[derive(Debug, Clone)]
pub struct MarkdownReportWriter {
    path: PathBuf,
}

impl MarkdownReportWriter {
    /// Creates a writer targeting the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the summary file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes already-formatted Markdown to the target file
    pub(crate) fn write_markdown(&self, markdown: &str) -> OutputResult<()> {
        let mut file = File::create(&self.path)?;
        file.write_all(markdown.as_bytes())?;
        tracing::info!("Wrote summary to {}", self.path.display());
        Ok(())
    }
}

impl ReportWriter<CrawlReport> for MarkdownReportWriter {
    fn write(&self, report: &CrawlReport) -> OutputResult<()> {
        self.write_markdown(&format_markdown_summary(report))
    }
}

/// Escapes a value for use inside a Markdown table cell
pub(crate) fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

/// Formats a crawl report as markdown
///
/// # Arguments
///
/// * `report` - The crawl report
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(report: &CrawlReport) -> String {
    let stats = CrawlStatistics::from_report(report);
    let mut md = String::new();

    md.push_str("# Site Link Audit Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Start URL**: {}\n", report.run.start_url));
    md.push_str(&format!("- **Started**: {}\n", report.run.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.run.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {} seconds\n",
        report.run.duration_seconds()
    ));
    md.push_str(&format!("- **Phase**: {}\n", report.run.phase));
    md.push_str(&format!("- **Config Hash**: {}\n\n", report.run.config_hash));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages Recorded**: {}\n", stats.total_pages));
    md.push_str(&format!("- **Links Recorded**: {}\n", stats.total_links));
    md.push_str(&format!("- **Internal Links**: {}\n", stats.internal_links));
    md.push_str(&format!("- **External Links**: {}\n", stats.external_links));
    md.push_str(&format!(
        "- **Broken Links**: {} (>= 400) + {} ERR\n",
        stats.broken_links, stats.error_links
    ));
    if stats.skipped_links > 0 {
        md.push_str(&format!(
            "- **Skipped by Link Caps**: {}\n",
            stats.skipped_links
        ));
    }
    md.push_str(&format!(
        "- **Page Success Rate**: {:.2}%\n\n",
        stats.page_success_rate()
    ));

    // Status breakdown
    if !stats.pages_by_status.is_empty() {
        md.push_str("## Page Status Breakdown\n\n");
        md.push_str("| Status | Pages |\n");
        md.push_str("|--------|-------|\n");
        for (status, count) in &stats.pages_by_status {
            md.push_str(&format!("| {} | {} |\n", status, count));
        }
        md.push('\n');
    }

    // Crawl summary sheet
    if !report.pages().is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| # | URL | Status | Title | Links | Depth |\n");
        md.push_str("|---|-----|--------|-------|-------|-------|\n");
        for page in report.pages() {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                page.order,
                escape_cell(&page.url),
                escape_cell(&page.fetch_status.to_string()),
                escape_cell(&page.title),
                page.link_count,
                page.depth
            ));
        }
        md.push('\n');
    }

    // Broken links
    let broken: Vec<_> = report
        .links()
        .iter()
        .filter(|l| l.http_status.is_broken())
        .collect();
    if !broken.is_empty() {
        md.push_str("## Broken Links\n\n");
        md.push_str("| Source | Link Text | Target | Status |\n");
        md.push_str("|--------|-----------|--------|--------|\n");
        for link in broken {
            let status = match link.http_status.error_detail() {
                Some(reason) => format!("ERR ({})", reason),
                None => link.http_status.to_string(),
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                escape_cell(&link.source_url),
                escape_cell(&link.link_text),
                escape_cell(link.best_url().unwrap_or(&link.raw_href)),
                escape_cell(&status)
            ));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{LinkRecord, PageRecord, ReportAggregator, RunInfo};
    use crate::state::{CrawlPhase, FetchStatus, LinkStatus};
    use crate::url::LinkScope;
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_report() -> CrawlReport {
        let mut records = ReportAggregator::new();
        records
            .add_page_with_links(
                PageRecord {
                    order: 1,
                    url: "https://example.com/".to_string(),
                    final_url: Some("https://example.com/".to_string()),
                    title: "Home | Example".to_string(),
                    fetch_status: FetchStatus::Status(200),
                    link_count: 2,
                    depth: 0,
                },
                vec![
                    LinkRecord {
                        source_url: "https://example.com/".to_string(),
                        source_title: "Home | Example".to_string(),
                        link_text: "Gone".to_string(),
                        raw_href: "/gone".to_string(),
                        absolute_url: Some("https://example.com/gone".to_string()),
                        resolved_url: Some("https://example.com/gone".to_string()),
                        http_status: LinkStatus::Status(404),
                        target: String::new(),
                        rel: String::new(),
                        scope: LinkScope::Internal,
                        screenshot: None,
                    },
                    LinkRecord {
                        source_url: "https://example.com/".to_string(),
                        source_title: "Home | Example".to_string(),
                        link_text: "Fine".to_string(),
                        raw_href: "/fine".to_string(),
                        absolute_url: Some("https://example.com/fine".to_string()),
                        resolved_url: Some("https://example.com/fine".to_string()),
                        http_status: LinkStatus::Status(200),
                        target: String::new(),
                        rel: String::new(),
                        scope: LinkScope::Internal,
                        screenshot: None,
                    },
                ],
            )
            .unwrap();

        let now = Utc::now();
        CrawlReport {
            run: RunInfo {
                start_url: "https://example.com/".to_string(),
                phase: CrawlPhase::Exhausted,
                started_at: now,
                finished_at: now,
                config_hash: "abc123".to_string(),
            },
            records,
        }
    }

    #[test]
    fn test_format_markdown_summary() {
        let markdown = format_markdown_summary(&create_test_report());

        assert!(markdown.contains("# Site Link Audit Summary"));
        assert!(markdown.contains("- **Phase**: Exhausted"));
        assert!(markdown.contains("- **Config Hash**: abc123"));
        assert!(markdown.contains("- **Links Recorded**: 2"));
    }

    #[test]
    fn test_markdown_escapes_table_cells() {
        let markdown = format_markdown_summary(&create_test_report());
        assert!(markdown.contains("Home \\| Example"));
    }

    #[test]
    fn test_markdown_lists_only_broken_links() {
        let markdown = format_markdown_summary(&create_test_report());
        let broken = markdown.split("## Broken Links").nth(1).unwrap();

        assert!(broken.contains("https://example.com/gone"));
        assert!(!broken.contains("https://example.com/fine"));
    }

    #[test]
    fn test_write_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.md");

        MarkdownReportWriter::new(&path)
            .write(&create_test_report())
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Site Link Audit Summary"));
    }
}
