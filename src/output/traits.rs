//! Report writer trait and associated types

use crate::output::aggregator::ReportAggregator;
use crate::output::records::{LinkRecord, PageRecord, RunInfo};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Page record out of order: {got} appended after {previous}")]
    OutOfOrder { previous: u32, got: u32 },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Everything a crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Run metadata
    pub run: RunInfo,

    /// Page and link records in crawl order
    pub records: ReportAggregator,
}

impl CrawlReport {
    /// Page records in crawl order
    pub fn pages(&self) -> &[PageRecord] {
        self.records.pages()
    }

    /// Link records in crawl order
    pub fn links(&self) -> &[LinkRecord] {
        self.records.links()
    }
}

/// Serializes a report to some destination
///
/// Implemented for [`CrawlReport`] and the compare-mode report.
pub trait ReportWriter<R: ?Sized> {
    /// Writes the whole report
    fn write(&self, report: &R) -> OutputResult<()>;
}
