//! Link resolution pipeline
//!
//! Turns the raw anchors of one page into link records: normalize, resolve
//! over HTTP, classify, screenshot, and decide crawl eligibility. Per-page
//! and run-wide link caps are enforced here.

use crate::config::Config;
use crate::crawler::fetcher::resolve_link;
use crate::crawler::parser::{sanitize_text, LINK_TEXT_MAX};
use crate::crawler::renderer::{NoScreenshots, RawAnchor, ScreenshotCapturer};
use crate::output::LinkRecord;
use crate::state::LinkStatus;
use crate::url::{normalize, LinkScope, NormalizeOptions, NormalizedUrl, ScopeClassifier};
use reqwest::Client;
use std::sync::Arc;
use url::Url;

/// A link record plus the page it may add to the frontier
#[derive(Debug, Clone)]
pub struct ResolvedLink {
    pub record: LinkRecord,

    /// Fragment-free URL to offer to the frontier, if crawl-eligible
    pub candidate: Option<NormalizedUrl>,
}

/// Links captured from one page
#[derive(Debug, Clone, Default)]
pub struct PageLinks {
    pub links: Vec<ResolvedLink>,
}

impl PageLinks {
    /// Crawl-eligible URLs in anchor order
    pub fn candidates(&self) -> impl Iterator<Item = &NormalizedUrl> {
        self.links.iter().filter_map(|l| l.candidate.as_ref())
    }

    /// Consumes the page links, returning the records
    pub fn into_records(self) -> Vec<LinkRecord> {
        self.links.into_iter().map(|l| l.record).collect()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// The page the anchors were found on
#[derive(Debug, Clone, Copy)]
pub struct SourcePage<'a> {
    /// URL the page landed on; relative hrefs resolve against it
    pub url: &'a Url,

    /// Sanitized page title
    pub title: &'a str,
}

/// Resolves anchors into link records
///
/// Holds the run-wide link counter, so one resolver is used for the whole
/// crawl.
pub struct LinkResolver {
    /// `None` when resolution is disabled
    client: Option<Client>,
    capturer: Arc<dyn ScreenshotCapturer>,
    screenshots: bool,
    opts: NormalizeOptions,
    max_links_per_page: u32,
    max_total_links: u32,
    total_processed: u32,
}

impl LinkResolver {
    /// Creates a resolver from the configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Crawl limits, normalization and network flags
    /// * `client` - HTTP client used when link resolution is enabled
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client: config.network.resolve_links.then_some(client),
            capturer: Arc::new(NoScreenshots),
            screenshots: config.output.screenshots,
            opts: NormalizeOptions::from_crawl_config(&config.crawl),
            max_links_per_page: config.crawl.max_links_per_page,
            max_total_links: config.crawl.max_total_links,
            total_processed: 0,
        }
    }

    /// Uses the given screenshot capturer
    pub fn with_capturer(mut self, capturer: Arc<dyn ScreenshotCapturer>) -> Self {
        self.capturer = capturer;
        self
    }

    /// Turns screenshot capture on or off
    pub fn with_screenshots(mut self, enabled: bool) -> Self {
        self.screenshots = enabled;
        self
    }

    /// Lifts the run-wide link cap; the per-page cap still applies
    pub fn without_total_limit(mut self) -> Self {
        self.max_total_links = u32::MAX;
        self
    }

    /// Returns true if links are resolved over HTTP
    pub fn resolves_links(&self) -> bool {
        self.client.is_some()
    }

    /// Number of links processed (not skipped) so far in the run
    pub fn total_processed(&self) -> u32 {
        self.total_processed
    }

    /// Returns true once the run-wide link cap is spent
    pub fn total_limit_reached(&self) -> bool {
        self.total_processed >= self.max_total_links
    }

    /// Resolves every anchor of one page
    ///
    /// Anchors without an `href`, and fragment-only hrefs unless fragments
    /// are kept, are not recorded. Every other anchor yields exactly one
    /// record, in document order. Failures degrade to recorded statuses.
    pub async fn resolve_page(
        &mut self,
        source: SourcePage<'_>,
        anchors: &[RawAnchor],
        scope: &ScopeClassifier,
    ) -> PageLinks {
        let mut page_processed = 0u32;
        let mut links = Vec::new();

        for anchor in anchors {
            let Some(href) = self.usable_href(anchor) else {
                continue;
            };

            let skip = if self.total_limit_reached() {
                Some(LinkStatus::SkippedTotalLimit)
            } else if page_processed >= self.max_links_per_page {
                Some(LinkStatus::SkippedPageLimit)
            } else {
                None
            };

            let link = match skip {
                Some(status) => {
                    tracing::trace!("Skipped ({}): {}", status, href);
                    self.skipped(source, anchor, href, status)
                }
                None => {
                    page_processed += 1;
                    self.total_processed += 1;
                    self.resolve_anchor(source, anchor, href, scope).await
                }
            };
            links.push(link);
        }

        PageLinks { links }
    }

    fn usable_href<'a>(&self, anchor: &'a RawAnchor) -> Option<&'a str> {
        let href = anchor.href.as_deref()?.trim();
        if href.is_empty() {
            return None;
        }
        if href.starts_with('#') && !self.opts.keep_fragment {
            return None;
        }
        Some(href)
    }

    async fn resolve_anchor(
        &self,
        source: SourcePage<'_>,
        anchor: &RawAnchor,
        href: &str,
        scope: &ScopeClassifier,
    ) -> ResolvedLink {
        let mut record = self.base_record(source, anchor, href);

        let absolute = match normalize(source.url, href, &self.opts) {
            Ok(absolute) => absolute,
            Err(e) => {
                tracing::trace!("Malformed href {:?}: {}", href, e);
                return ResolvedLink {
                    record,
                    candidate: None,
                };
            }
        };
        record.absolute_url = Some(absolute.to_string());

        if !absolute.is_web() {
            return ResolvedLink {
                record,
                candidate: None,
            };
        }

        let resolved = match &self.client {
            Some(client) => {
                let resolution = resolve_link(client, absolute.as_url()).await;
                record.http_status = resolution.status;
                resolution.final_url
            }
            None => absolute.as_url().clone(),
        };
        record.scope = scope.classify(&resolved);
        record.resolved_url = Some(resolved.to_string());

        if self.screenshots {
            record.screenshot = self.capturer.capture(source.url, &anchor.locator).await;
        }

        let candidate = scope
            .decide(&absolute)
            .is_crawlable()
            .then(|| absolute.without_fragment());

        ResolvedLink { record, candidate }
    }

    fn skipped(
        &self,
        source: SourcePage<'_>,
        anchor: &RawAnchor,
        href: &str,
        status: LinkStatus,
    ) -> ResolvedLink {
        let mut record = self.base_record(source, anchor, href);
        record.http_status = status;
        if let Ok(absolute) = normalize(source.url, href, &self.opts) {
            record.absolute_url = Some(absolute.to_string());
        }
        ResolvedLink {
            record,
            candidate: None,
        }
    }

    /// A record with no resolution, classified External
    fn base_record(&self, source: SourcePage<'_>, anchor: &RawAnchor, href: &str) -> LinkRecord {
        let mut link_text = sanitize_text(&anchor.text, LINK_TEXT_MAX);
        if link_text.is_empty() {
            if let Some(label) = &anchor.aria_label {
                link_text = sanitize_text(label, LINK_TEXT_MAX);
            }
        }

        LinkRecord {
            source_url: source.url.to_string(),
            source_title: source.title.to_string(),
            link_text,
            raw_href: href.to_string(),
            absolute_url: None,
            resolved_url: None,
            http_status: LinkStatus::NotResolved,
            target: anchor.target.clone(),
            rel: anchor.rel.clone(),
            scope: LinkScope::External,
            screenshot: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::renderer::ElementLocator;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn anchor(href: Option<&str>, text: &str, index: usize) -> RawAnchor {
        RawAnchor {
            href: href.map(str::to_string),
            text: text.to_string(),
            aria_label: None,
            target: String::new(),
            rel: String::new(),
            locator: ElementLocator(index),
        }
    }

    fn config() -> Config {
        let mut config = Config::for_start_url("https://example.com/");
        config.network.resolve_links = false;
        config
    }

    fn resolver(config: &Config) -> LinkResolver {
        LinkResolver::new(config, Client::new())
    }

    fn scope(config: &Config) -> ScopeClassifier {
        let seed = crate::url::normalize_url(&config.crawl.start_url, &NormalizeOptions::default())
            .unwrap();
        ScopeClassifier::from_config(&seed, &config.crawl).unwrap()
    }

    fn page_url() -> Url {
        Url::parse("https://example.com/docs/").unwrap()
    }

    fn source(url: &Url) -> SourcePage<'_> {
        SourcePage {
            url,
            title: "Docs",
        }
    }

    #[tokio::test]
    async fn test_intake_drops_missing_and_fragment_hrefs() {
        let config = config();
        let url = page_url();
        let anchors = vec![
            anchor(None, "no href", 0),
            anchor(Some("   "), "blank", 1),
            anchor(Some("#section"), "fragment", 2),
            anchor(Some("guide"), "Guide", 3),
        ];

        let links = resolver(&config)
            .resolve_page(source(&url), &anchors, &scope(&config))
            .await;

        assert_eq!(links.len(), 1);
        let record = &links.links[0].record;
        assert_eq!(record.link_text, "Guide");
        assert_eq!(
            record.absolute_url.as_deref(),
            Some("https://example.com/docs/guide")
        );
        assert_eq!(record.source_url, "https://example.com/docs/");
        assert_eq!(record.source_title, "Docs");
    }

    #[tokio::test]
    async fn test_fragment_hrefs_kept_when_enabled() {
        let mut config = config();
        config.crawl.include_fragments = true;
        let url = page_url();
        let anchors = vec![anchor(Some("#section"), "Section", 0)];

        let links = resolver(&config)
            .resolve_page(source(&url), &anchors, &scope(&config))
            .await;

        assert_eq!(links.len(), 1);
        assert_eq!(
            links.links[0].record.absolute_url.as_deref(),
            Some("https://example.com/docs/#section")
        );
        // the page itself, fragment dropped, is the crawl candidate
        assert_eq!(
            links.links[0].candidate.as_ref().map(|c| c.as_str()),
            Some("https://example.com/docs/")
        );
    }

    #[tokio::test]
    async fn test_non_web_scheme_recorded_external() {
        let config = config();
        let url = page_url();
        let anchors = vec![anchor(Some("mailto:team@example.com"), "Mail", 0)];

        let links = resolver(&config)
            .resolve_page(source(&url), &anchors, &scope(&config))
            .await;

        let link = &links.links[0];
        assert_eq!(link.record.scope, LinkScope::External);
        assert_eq!(link.record.http_status, LinkStatus::NotResolved);
        assert_eq!(link.record.resolved_url, None);
        assert!(link.record.absolute_url.is_some());
        assert!(link.candidate.is_none());
    }

    #[tokio::test]
    async fn test_malformed_href_recorded_external() {
        let config = config();
        let url = page_url();
        let anchors = vec![anchor(Some("http://[::1"), "Broken", 0)];

        let links = resolver(&config)
            .resolve_page(source(&url), &anchors, &scope(&config))
            .await;

        let record = &links.links[0].record;
        assert_eq!(record.absolute_url, None);
        assert_eq!(record.resolved_url, None);
        assert_eq!(record.http_status, LinkStatus::NotResolved);
        assert_eq!(record.scope, LinkScope::External);
        assert_eq!(record.raw_href, "http://[::1");
    }

    #[tokio::test]
    async fn test_unresolved_links_keep_absolute_as_resolved() {
        let config = config();
        let url = page_url();
        let anchors = vec![
            anchor(Some("/about"), "About", 0),
            anchor(Some("https://other.test/"), "Other", 1),
        ];

        let links = resolver(&config)
            .resolve_page(source(&url), &anchors, &scope(&config))
            .await;

        let internal = &links.links[0];
        assert_eq!(
            internal.record.resolved_url.as_deref(),
            Some("https://example.com/about")
        );
        assert_eq!(internal.record.scope, LinkScope::Internal);
        assert!(internal.candidate.is_some());

        let external = &links.links[1];
        assert_eq!(external.record.scope, LinkScope::External);
        assert!(external.candidate.is_none());
    }

    #[tokio::test]
    async fn test_per_page_cap() {
        let mut config = config();
        config.crawl.max_links_per_page = 3;
        let url = page_url();
        let anchors: Vec<_> = (0..5)
            .map(|i| anchor(Some(&format!("/p{}", i)), "p", i))
            .collect();

        let mut resolver = resolver(&config);
        let links = resolver
            .resolve_page(source(&url), &anchors, &scope(&config))
            .await;

        assert_eq!(links.len(), 5);
        let skipped: Vec<_> = links
            .links
            .iter()
            .filter(|l| l.record.http_status == LinkStatus::SkippedPageLimit)
            .collect();
        assert_eq!(skipped.len(), 2);
        assert!(skipped.iter().all(|l| l.candidate.is_none()));
        assert_eq!(links.candidates().count(), 3);
        assert_eq!(resolver.total_processed(), 3);

        // the cap is per page
        let links = resolver
            .resolve_page(source(&url), &anchors[..2], &scope(&config))
            .await;
        assert_eq!(links.candidates().count(), 2);
    }

    #[tokio::test]
    async fn test_total_cap_spans_pages() {
        let mut config = config();
        config.crawl.max_total_links = 3;
        let url = page_url();
        let anchors: Vec<_> = (0..2)
            .map(|i| anchor(Some(&format!("/p{}", i)), "p", i))
            .collect();

        let mut resolver = resolver(&config);
        resolver
            .resolve_page(source(&url), &anchors, &scope(&config))
            .await;
        assert!(!resolver.total_limit_reached());

        let links = resolver
            .resolve_page(source(&url), &anchors, &scope(&config))
            .await;
        assert_eq!(links.links[0].record.http_status, LinkStatus::NotResolved);
        assert_eq!(
            links.links[1].record.http_status,
            LinkStatus::SkippedTotalLimit
        );
        assert!(resolver.total_limit_reached());
    }

    #[tokio::test]
    async fn test_aria_label_fallback() {
        let config = config();
        let url = page_url();
        let mut icon = anchor(Some("/search"), "  \n ", 0);
        icon.aria_label = Some("Search the   docs".to_string());

        let links = resolver(&config)
            .resolve_page(source(&url), &[icon], &scope(&config))
            .await;
        assert_eq!(links.links[0].record.link_text, "Search the docs");
    }

    struct CountingCapturer(AtomicUsize);

    #[async_trait]
    impl ScreenshotCapturer for CountingCapturer {
        async fn capture(&self, _page: &Url, locator: &ElementLocator) -> Option<Vec<u8>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            // element 1 is hidden
            (locator.0 != 1).then(|| vec![1, 2, 3])
        }
    }

    #[tokio::test]
    async fn test_screenshots_only_for_processed_links() {
        let mut config = config();
        config.crawl.max_links_per_page = 2;
        let url = page_url();
        let anchors: Vec<_> = (0..3)
            .map(|i| anchor(Some(&format!("/p{}", i)), "p", i))
            .collect();

        let capturer = Arc::new(CountingCapturer(AtomicUsize::new(0)));
        let mut resolver = resolver(&config)
            .with_capturer(capturer.clone())
            .with_screenshots(true);
        let links = resolver
            .resolve_page(source(&url), &anchors, &scope(&config))
            .await;

        assert_eq!(capturer.0.load(Ordering::SeqCst), 2);
        assert_eq!(links.links[0].record.screenshot, Some(vec![1, 2, 3]));
        assert_eq!(links.links[1].record.screenshot, None);
        assert_eq!(links.links[2].record.screenshot, None);
    }
}
