//! Output module for crawl records and reports
//!
//! This module handles:
//! - Accumulating page and link records in crawl order
//! - Writing the SQLite workbook and the Markdown summary
//! - Computing crawl statistics for the console

mod aggregator;
mod markdown;
mod records;
pub(crate) mod schema;
mod sqlite_output;
pub mod stats;
mod traits;

pub use aggregator::ReportAggregator;
pub use markdown::{format_markdown_summary, MarkdownReportWriter};
pub(crate) use markdown::escape_cell;
pub use records::{LinkRecord, PageRecord, RunInfo};
pub use sqlite_output::SqliteReportWriter;
pub(crate) use sqlite_output::insert_run;
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{CrawlReport, OutputError, OutputResult, ReportWriter};
