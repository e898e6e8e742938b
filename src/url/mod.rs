//! URL handling module for Site-Link-Audit
//!
//! This module provides URL normalization, host extraction, host and regex
//! pattern matching, and the scope classification that decides which links
//! are internal and which may be crawled.

mod domain;
mod matcher;
mod normalize;

use crate::config::CrawlConfig;
use std::fmt;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, origin_key};
pub use matcher::{host_in_scope, UrlPatterns};
pub use normalize::{normalize, normalize_url, normalize_web_url, NormalizeOptions, NormalizedUrl};

/// Display classification of a link target relative to the seed host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkScope {
    Internal,
    External,
}

impl LinkScope {
    /// Converts to the string stored in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "Internal",
            Self::External => "External",
        }
    }
}

impl fmt::Display for LinkScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crawl eligibility of a URL under the current configuration
///
/// Derived per URL, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeDecision {
    /// Internal host and passes the pattern filters
    InternalCrawlable,
    /// Internal host rejected by the pattern filters
    InternalOutOfScope,
    /// External host, not crawled
    External,
    /// External host crawled because same-domain-only is off
    ExternalCrawlable,
    /// Not a web URL (`mailto:`, `javascript:`...); never crawled
    Blocked,
}

impl ScopeDecision {
    /// Returns true if the URL may be enqueued
    pub fn is_crawlable(&self) -> bool {
        matches!(self, Self::InternalCrawlable | Self::ExternalCrawlable)
    }

    /// Returns the display classification implied by this decision
    pub fn scope(&self) -> LinkScope {
        match self {
            Self::InternalCrawlable | Self::InternalOutOfScope => LinkScope::Internal,
            Self::External | Self::ExternalCrawlable | Self::Blocked => LinkScope::External,
        }
    }
}

/// Classifies a URL as internal or external relative to the seed host
///
/// Internal iff the host equals the seed host, or `include_subdomains` is set
/// and the host is a subdomain of it. URLs without a host are external.
/// Ports are ignored.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_link_audit::url::{classify_url, LinkScope};
///
/// let url = Url::parse("https://blog.example.com/post").unwrap();
/// assert_eq!(classify_url("example.com", &url, false), LinkScope::External);
/// assert_eq!(classify_url("example.com", &url, true), LinkScope::Internal);
/// ```
pub fn classify_url(seed_host: &str, url: &Url, include_subdomains: bool) -> LinkScope {
    match extract_domain(url) {
        Some(host) if host_in_scope(seed_host, &host, include_subdomains) => LinkScope::Internal,
        _ => LinkScope::External,
    }
}

/// Scope rules for one crawl, with the regex filters compiled up front
#[derive(Debug, Clone)]
pub struct ScopeClassifier {
    seed_host: String,
    same_domain_only: bool,
    include_subdomains: bool,
    patterns: UrlPatterns,
}

impl ScopeClassifier {
    /// Creates a classifier anchored on the seed URL's host
    pub fn new(
        seed: &NormalizedUrl,
        same_domain_only: bool,
        include_subdomains: bool,
        patterns: UrlPatterns,
    ) -> crate::UrlResult<Self> {
        let seed_host = extract_domain(seed.as_url()).ok_or(crate::UrlError::MissingDomain)?;
        Ok(Self {
            seed_host,
            same_domain_only,
            include_subdomains,
            patterns,
        })
    }

    /// Creates a classifier from the crawl configuration
    pub fn from_config(seed: &NormalizedUrl, config: &CrawlConfig) -> crate::Result<Self> {
        let patterns = UrlPatterns::compile(
            config.pattern_include.as_deref(),
            config.pattern_exclude.as_deref(),
        )?;
        Ok(Self::new(
            seed,
            config.same_domain_only,
            config.include_subdomains,
            patterns,
        )?)
    }

    /// Returns a copy of this classifier anchored on another host
    ///
    /// Used when the same rules are applied to a second site.
    pub fn with_seed_host(&self, host: &str) -> Self {
        Self {
            seed_host: host.to_lowercase(),
            ..self.clone()
        }
    }

    /// Returns the seed host
    pub fn seed_host(&self) -> &str {
        &self.seed_host
    }

    /// Internal/External display classification of any URL
    pub fn classify(&self, url: &Url) -> LinkScope {
        classify_url(&self.seed_host, url, self.include_subdomains)
    }

    /// Decides crawl eligibility of a normalized URL
    ///
    /// Non-web URLs are `Blocked`. Otherwise the pattern filters apply to
    /// both internal and external hosts, and external hosts are only
    /// crawlable when same-domain-only is off.
    pub fn decide(&self, url: &NormalizedUrl) -> ScopeDecision {
        if !url.is_web() {
            return ScopeDecision::Blocked;
        }

        let scope = self.classify(url.as_url());
        let allowed = self.patterns.allows(url.as_str());

        match (scope, allowed) {
            (LinkScope::Internal, true) => ScopeDecision::InternalCrawlable,
            (LinkScope::Internal, false) => ScopeDecision::InternalOutOfScope,
            (LinkScope::External, true) if !self.same_domain_only => {
                ScopeDecision::ExternalCrawlable
            }
            (LinkScope::External, _) => ScopeDecision::External,
        }
    }
}
