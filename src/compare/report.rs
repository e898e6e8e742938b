//! SQLite and Markdown output for compare runs

use crate::compare::{CompareReport, DiffKind};
use crate::config::CompareBy;
use crate::output::{
    escape_cell, insert_run, MarkdownReportWriter, OutputResult, ReportWriter, SqliteReportWriter,
};
use rusqlite::params;

impl ReportWriter<CompareReport> for SqliteReportWriter {
    fn write(&self, report: &CompareReport) -> OutputResult<()> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let run_id = insert_run(&tx, "compare", &report.run)?;

        {
            let mut page_stmt = tx.prepare(
                "INSERT INTO diff_pages (run_id, page_order, baseline_url, upgraded_url,
                                         baseline_title, upgraded_title, baseline_status,
                                         upgraded_status, missing, extra, wrong)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            let mut diff_stmt = tx.prepare(
                "INSERT INTO diffs (run_id, page_order, kind, link_text, baseline_target,
                                    upgraded_target, baseline_status, upgraded_status, note)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;

            for page in &report.pages {
                page_stmt.execute(params![
                    run_id,
                    page.order,
                    page.baseline_url,
                    page.upgraded_url,
                    page.baseline_title,
                    page.upgraded_title,
                    page.baseline_status.label(),
                    page.upgraded_status.label(),
                    page.counts.missing,
                    page.counts.extra,
                    page.counts.wrong,
                ])?;

                for diff in &page.diffs {
                    diff_stmt.execute(params![
                        run_id,
                        page.order,
                        diff.kind.as_str(),
                        diff.link_text,
                        diff.baseline_target,
                        diff.upgraded_target,
                        diff.baseline_status,
                        diff.upgraded_status,
                        diff.note,
                    ])?;
                }
            }
        }

        tx.commit()?;

        let totals = report.totals();
        tracing::info!(
            "Wrote {} compared pages and {} differences to {}",
            report.pages.len(),
            totals.total(),
            self.path().display()
        );
        Ok(())
    }
}

impl ReportWriter<CompareReport> for MarkdownReportWriter {
    fn write(&self, report: &CompareReport) -> OutputResult<()> {
        self.write_markdown(&format_markdown_diff(report))
    }
}

/// Formats a compare report as markdown
pub fn format_markdown_diff(report: &CompareReport) -> String {
    let totals = report.totals();
    let mut md = String::new();

    md.push_str("# Site Link Compare Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Baseline**: {}\n", report.run.start_url));
    md.push_str(&format!("- **Upgraded**: {}\n", report.upgraded_url));
    md.push_str(&format!(
        "- **Compared By**: {}\n",
        match report.compare_by {
            CompareBy::FinalUrl => "final URL",
            CompareBy::AbsoluteUrl => "absolute URL",
        }
    ));
    md.push_str(&format!("- **Started**: {}\n", report.run.started_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {} seconds\n",
        report.run.duration_seconds()
    ));
    md.push_str(&format!("- **Phase**: {}\n", report.run.phase));
    md.push_str(&format!("- **Config Hash**: {}\n\n", report.run.config_hash));

    md.push_str("## Totals\n\n");
    md.push_str(&format!("- **Pages Compared**: {}\n", report.pages.len()));
    md.push_str(&format!(
        "- **Pages With Differences**: {}\n",
        report.pages_with_diffs().count()
    ));
    md.push_str(&format!("- **Missing**: {}\n", totals.missing));
    md.push_str(&format!("- **Extra**: {}\n", totals.extra));
    md.push_str(&format!("- **Wrong**: {}\n\n", totals.wrong));

    md.push_str("## Pages\n\n");
    md.push_str("| # | Baseline | Upgraded | Baseline Status | Upgraded Status | Missing | Extra | Wrong |\n");
    md.push_str("|---|----------|----------|-----------------|-----------------|---------|-------|-------|\n");
    for page in &report.pages {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            page.order,
            escape_cell(&page.baseline_url),
            escape_cell(&page.upgraded_url),
            page.baseline_status.label(),
            page.upgraded_status.label(),
            page.counts.missing,
            page.counts.extra,
            page.counts.wrong,
        ));
    }
    md.push('\n');

    for kind in [DiffKind::Wrong, DiffKind::Missing, DiffKind::Extra] {
        let rows: Vec<_> = report
            .pages
            .iter()
            .flat_map(|p| p.diffs.iter().map(move |d| (p, d)))
            .filter(|(_, d)| d.kind == kind)
            .collect();
        if rows.is_empty() {
            continue;
        }

        md.push_str(&format!("## {} Links\n\n", kind));
        md.push_str("| Page | Text | Baseline Target | Upgraded Target | Note |\n");
        md.push_str("|------|------|-----------------|-----------------|------|\n");
        for (page, diff) in rows {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                escape_cell(&page.baseline_url),
                escape_cell(&diff.link_text),
                escape_cell(&diff.baseline_target),
                escape_cell(&diff.upgraded_target),
                escape_cell(&diff.note),
            ));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{DiffCounts, LinkDiff, PageComparison, NOTE_TARGET_CHANGED};
    use crate::output::RunInfo;
    use crate::state::{CrawlPhase, FetchStatus};
    use chrono::Utc;
    use rusqlite::Connection;
    use tempfile::TempDir;

    fn sample_report() -> CompareReport {
        let now = Utc::now();
        CompareReport {
            run: RunInfo {
                start_url: "https://old.test/".to_string(),
                phase: CrawlPhase::Exhausted,
                started_at: now,
                finished_at: now,
                config_hash: "cafe".to_string(),
            },
            upgraded_url: "https://new.test/".to_string(),
            compare_by: CompareBy::FinalUrl,
            pages: vec![
                PageComparison {
                    order: 1,
                    baseline_url: "https://old.test/".to_string(),
                    upgraded_url: "https://new.test/".to_string(),
                    baseline_title: "Home".to_string(),
                    upgraded_title: "Home".to_string(),
                    baseline_status: FetchStatus::Status(200),
                    upgraded_status: FetchStatus::Status(200),
                    counts: DiffCounts {
                        missing: 1,
                        extra: 0,
                        wrong: 1,
                    },
                    diffs: vec![
                        LinkDiff {
                            kind: DiffKind::Wrong,
                            link_text: "Plans | Pricing".to_string(),
                            baseline_target: "https://old.test/pricing".to_string(),
                            upgraded_target: "https://old.test/plans".to_string(),
                            baseline_status: String::new(),
                            upgraded_status: String::new(),
                            note: NOTE_TARGET_CHANGED.to_string(),
                        },
                        LinkDiff {
                            kind: DiffKind::Missing,
                            link_text: "Blog".to_string(),
                            baseline_target: "https://old.test/blog".to_string(),
                            upgraded_target: String::new(),
                            baseline_status: "200".to_string(),
                            upgraded_status: String::new(),
                            note: String::new(),
                        },
                    ],
                },
                PageComparison {
                    order: 2,
                    baseline_url: "https://old.test/about".to_string(),
                    upgraded_url: "https://new.test/about".to_string(),
                    baseline_title: "About".to_string(),
                    upgraded_title: String::new(),
                    baseline_status: FetchStatus::Status(200),
                    upgraded_status: FetchStatus::Status(404),
                    counts: DiffCounts::default(),
                    diffs: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn test_sqlite_compare_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("compare.db");
        let writer = SqliteReportWriter::new(&path);

        writer.write(&sample_report()).unwrap();

        let conn = Connection::open(&path).unwrap();
        let mode: String = conn
            .query_row("SELECT mode FROM runs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "compare");

        let pages: i64 = conn
            .query_row("SELECT COUNT(*) FROM diff_pages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(pages, 2);

        let status: String = conn
            .query_row(
                "SELECT upgraded_status FROM diff_pages WHERE page_order = 2",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(status, "404");

        let kinds: Vec<String> = conn
            .prepare("SELECT kind FROM diffs ORDER BY id")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(kinds, vec!["Wrong", "Missing"]);
    }

    #[test]
    fn test_markdown_diff_summary() {
        let md = format_markdown_diff(&sample_report());

        assert!(md.contains("# Site Link Compare Summary"));
        assert!(md.contains("- **Upgraded**: https://new.test/"));
        assert!(md.contains("- **Pages With Differences**: 1"));
        assert!(md.contains("## Wrong Links"));
        assert!(md.contains("## Missing Links"));
        assert!(!md.contains("## Extra Links"));
        assert!(md.contains("Plans \\| Pricing"));
    }

    #[test]
    fn test_markdown_writer_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("compare.md");

        MarkdownReportWriter::new(&path)
            .write(&sample_report())
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Site Link Compare Summary"));
    }

    #[test]
    fn test_unfetched_upgraded_page_label_agrees() {
        let mut report = sample_report();
        report.pages.push(PageComparison {
            order: 3,
            baseline_url: "https://old.test/private".to_string(),
            upgraded_url: "https://new.test/private".to_string(),
            baseline_title: String::new(),
            upgraded_title: String::new(),
            baseline_status: FetchStatus::Blocked,
            upgraded_status: FetchStatus::Unverified,
            counts: DiffCounts::default(),
            diffs: Vec::new(),
        });

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("compare.db");
        SqliteReportWriter::new(&path).write(&report).unwrap();

        let conn = Connection::open(&path).unwrap();
        let (baseline, upgraded): (String, String) = conn
            .query_row(
                "SELECT baseline_status, upgraded_status FROM diff_pages WHERE page_order = 3",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(baseline, "blocked");
        assert_eq!(upgraded, "unverified");

        let md = format_markdown_diff(&report);
        assert!(md.contains("| blocked | unverified |"));
    }
}
