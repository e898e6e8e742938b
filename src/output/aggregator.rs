//! Append-only accumulation of page and link records

use crate::output::records::{LinkRecord, PageRecord};
use crate::output::traits::{OutputError, OutputResult};

/// Accumulates page and link records in crawl order
///
/// Records are never mutated or deduplicated after being appended, so the
/// contents are always a consistent prefix of a full crawl.
#[derive(Debug, Clone, Default)]
pub struct ReportAggregator {
    pages: Vec<PageRecord>,
    links: Vec<LinkRecord>,
}

impl ReportAggregator {
    /// Creates an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a page record
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Record appended
    /// * `Err(OutputError::OutOfOrder)` - `order` is not greater than the
    ///   previous page's
    pub fn add_page(&mut self, page: PageRecord) -> OutputResult<()> {
        if let Some(last) = self.pages.last() {
            if page.order <= last.order {
                return Err(OutputError::OutOfOrder {
                    previous: last.order,
                    got: page.order,
                });
            }
        }
        self.pages.push(page);
        Ok(())
    }

    /// Appends a link record
    pub fn add_link(&mut self, link: LinkRecord) {
        self.links.push(link);
    }

    /// Appends a page together with its links
    ///
    /// Nothing is appended if the page is out of order.
    pub fn add_page_with_links(
        &mut self,
        page: PageRecord,
        links: Vec<LinkRecord>,
    ) -> OutputResult<()> {
        self.add_page(page)?;
        self.links.extend(links);
        Ok(())
    }

    /// Page records in insertion order
    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    /// Link records in insertion order
    pub fn links(&self) -> &[LinkRecord] {
        &self.links
    }

    /// Order number the next page record should carry
    pub fn next_order(&self) -> u32 {
        self.pages.last().map_or(1, |p| p.order + 1)
    }

    /// Link records captured from one source page
    pub fn links_from<'a>(&'a self, source_url: &'a str) -> impl Iterator<Item = &'a LinkRecord> {
        self.links.iter().filter(move |l| l.source_url == source_url)
    }

    /// Returns true if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FetchStatus, LinkStatus};
    use crate::url::LinkScope;

    fn page(order: u32) -> PageRecord {
        PageRecord {
            order,
            url: format!("https://example.com/{}", order),
            final_url: None,
            title: String::new(),
            fetch_status: FetchStatus::Status(200),
            link_count: 0,
            depth: 0,
        }
    }

    fn link(source: &str, text: &str) -> LinkRecord {
        LinkRecord {
            source_url: source.to_string(),
            source_title: String::new(),
            link_text: text.to_string(),
            raw_href: "/".to_string(),
            absolute_url: Some("https://example.com/".to_string()),
            resolved_url: None,
            http_status: LinkStatus::NotResolved,
            target: String::new(),
            rel: String::new(),
            scope: LinkScope::Internal,
            screenshot: None,
        }
    }

    #[test]
    fn test_pages_keep_insertion_order() {
        let mut agg = ReportAggregator::new();
        assert_eq!(agg.next_order(), 1);
        agg.add_page(page(1)).unwrap();
        agg.add_page(page(2)).unwrap();
        agg.add_page(page(5)).unwrap();

        let orders: Vec<u32> = agg.pages().iter().map(|p| p.order).collect();
        assert_eq!(orders, vec![1, 2, 5]);
        assert_eq!(agg.next_order(), 6);
    }

    #[test]
    fn test_rejects_non_increasing_order() {
        let mut agg = ReportAggregator::new();
        agg.add_page(page(2)).unwrap();

        let err = agg.add_page(page(2)).unwrap_err();
        assert!(matches!(err, OutputError::OutOfOrder { previous: 2, got: 2 }));
        assert!(agg.add_page(page(1)).is_err());
        assert_eq!(agg.pages().len(), 1);
    }

    #[test]
    fn test_duplicate_links_are_kept() {
        let mut agg = ReportAggregator::new();
        agg.add_link(link("https://example.com/1", "Home"));
        agg.add_link(link("https://example.com/1", "Home"));
        assert_eq!(agg.links().len(), 2);
    }

    #[test]
    fn test_add_page_with_links_is_all_or_nothing() {
        let mut agg = ReportAggregator::new();
        agg.add_page_with_links(page(1), vec![link("https://example.com/1", "a")])
            .unwrap();

        let result = agg.add_page_with_links(page(1), vec![link("https://example.com/1", "b")]);
        assert!(result.is_err());
        assert_eq!(agg.links().len(), 1);
    }

    #[test]
    fn test_links_from() {
        let mut agg = ReportAggregator::new();
        assert!(agg.is_empty());
        agg.add_link(link("https://example.com/1", "a"));
        agg.add_link(link("https://example.com/2", "b"));
        agg.add_link(link("https://example.com/1", "c"));

        let texts: Vec<&str> = agg
            .links_from("https://example.com/1")
            .map(|l| l.link_text.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "c"]);
    }
}
