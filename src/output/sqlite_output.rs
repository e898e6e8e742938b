//! SQLite report writer
//!
//! Writes the audit workbook as a SQLite file: one `runs` row per write plus
//! the `pages` and `links` sheets, in insertion order.

use crate::output::records::RunInfo;
use crate::output::schema::initialize_schema;
use crate::output::traits::{CrawlReport, OutputResult, ReportWriter};
use rusqlite::{params, Connection, Transaction};
use std::path::{Path, PathBuf};

/// Writes reports into a SQLite database
///
/// Each call to `write` appends a new run; earlier runs in the same file
/// are left untouched.
#[derive(Debug, Clone)]
pub struct SqliteReportWriter {
    path: PathBuf,
}

impl SqliteReportWriter {
    /// Creates a writer targeting the given database file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the database, creating the schema if needed
    pub(crate) fn open(&self) -> OutputResult<Connection> {
        let conn = Connection::open(&self.path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        Ok(conn)
    }
}

/// Inserts the `runs` row and returns its id
pub(crate) fn insert_run(tx: &Transaction<'_>, mode: &str, run: &RunInfo) -> OutputResult<i64> {
    tx.execute(
        "INSERT INTO runs (mode, start_url, phase, started_at, finished_at, config_hash)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            mode,
            run.start_url,
            run.phase.to_db_string(),
            run.started_at.to_rfc3339(),
            run.finished_at.to_rfc3339(),
            run.config_hash,
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

impl ReportWriter<CrawlReport> for SqliteReportWriter {
    fn write(&self, report: &CrawlReport) -> OutputResult<()> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let run_id = insert_run(&tx, "crawl", &report.run)?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO pages (run_id, page_order, url, final_url, title, fetch_status,
                                    error_message, links_captured, depth)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for page in report.pages() {
                stmt.execute(params![
                    run_id,
                    page.order,
                    page.url,
                    page.final_url,
                    page.title,
                    page.fetch_status.label(),
                    page.fetch_status.error_detail(),
                    page.link_count as i64,
                    page.depth,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO links (run_id, position, source_url, source_title, screenshot,
                                    link_text, raw_href, absolute_url, resolved_url,
                                    http_status, error_message, target, rel, scope)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )?;
            for (position, link) in report.links().iter().enumerate() {
                stmt.execute(params![
                    run_id,
                    position as i64 + 1,
                    link.source_url,
                    link.source_title,
                    link.screenshot.as_deref(),
                    link.link_text,
                    link.raw_href,
                    link.absolute_url,
                    link.resolved_url,
                    link.http_status.label(),
                    link.http_status.error_detail(),
                    link.target,
                    link.rel,
                    link.scope.as_str(),
                ])?;
            }
        }

        tx.commit()?;

        tracing::info!(
            "Wrote {} pages and {} links to {}",
            report.pages().len(),
            report.links().len(),
            self.path.display()
        );
        Ok(())
    }
}
