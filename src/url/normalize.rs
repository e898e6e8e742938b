use crate::UrlError;
use std::fmt;
use url::Url;

/// List of tracking query parameters removed when tracking stripping is on
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
];

/// Schemes that can be fetched and crawled
const WEB_SCHEMES: &[&str] = &["http", "https"];

/// Knobs controlling how a URL is canonicalized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Keep the query string instead of dropping it
    pub keep_query: bool,
    /// Keep the fragment so fragment links become distinct targets
    pub keep_fragment: bool,
    /// Drop tracking parameters from a kept query
    pub strip_tracking_params: bool,
}

impl NormalizeOptions {
    /// Builds options from the crawl configuration flags
    pub fn from_crawl_config(config: &crate::config::CrawlConfig) -> Self {
        Self {
            keep_query: config.keep_query,
            keep_fragment: config.include_fragments,
            strip_tracking_params: config.strip_tracking_params,
        }
    }
}

/// A URL in canonical form
///
/// Two URLs refer to the same page iff their normalized forms are equal.
/// Values are only produced by [`normalize`] and [`normalize_url`], so the
/// canonical rules always hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    /// Returns the canonical string form
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Borrows the underlying parsed URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Consumes the wrapper and returns the parsed URL
    pub fn into_url(self) -> Url {
        self.0
    }

    /// Returns the lowercase host, if the URL has one
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    /// Returns true for http and https URLs
    pub fn is_web(&self) -> bool {
        WEB_SCHEMES.contains(&self.0.scheme()) && self.0.host_str().is_some()
    }

    /// Returns a copy without the fragment
    ///
    /// Page identity (the visited set) always uses this form, even when
    /// fragments are kept for link records.
    pub fn without_fragment(&self) -> NormalizedUrl {
        if self.0.fragment().is_none() {
            return self.clone();
        }
        let mut url = self.0.clone();
        url.set_fragment(None);
        NormalizedUrl(url)
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Resolves `raw` against `base` and canonicalizes the result
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject empty input
/// 2. Resolve against `base` (absolute input ignores the base)
/// 3. Lowercase scheme and host, drop default ports, remove dot segments,
///    turn an empty path into `/` (done by the `url` parser for web schemes)
/// 4. Remove the fragment unless `keep_fragment` is set
/// 5. Remove the query unless `keep_query` is set; with
///    `strip_tracking_params`, drop tracking parameters from a kept query
/// 6. Remove an empty query string (trailing `?`)
///
/// Path case and trailing slashes are preserved. Non-web schemes
/// (`mailto:`, `javascript:`...) normalize successfully so they can be
/// recorded, but [`NormalizedUrl::is_web`] is false for them.
///
/// # Arguments
///
/// * `base` - The URL of the page the link was found on
/// * `raw` - The raw href
/// * `opts` - Query and fragment handling
///
/// # Returns
///
/// * `Ok(NormalizedUrl)` - Canonical URL
/// * `Err(UrlError::Malformed)` - The input cannot be parsed
///
/// # Examples
///
/// ```
/// use site_link_audit::url::{normalize, NormalizeOptions};
/// use url::Url;
///
/// let base = Url::parse("https://Example.com/docs/intro").unwrap();
/// let url = normalize(&base, "../About?x=1#team", &NormalizeOptions::default()).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/About");
/// ```
pub fn normalize(base: &Url, raw: &str, opts: &NormalizeOptions) -> Result<NormalizedUrl, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Malformed("empty URL".to_string()));
    }

    let url = base
        .join(trimmed)
        .map_err(|e| UrlError::Malformed(format!("{}: {}", trimmed, e)))?;

    Ok(canonicalize(url, opts))
}

/// Normalizes an absolute URL string
///
/// # Examples
///
/// ```
/// use site_link_audit::url::{normalize_url, NormalizeOptions};
///
/// let url = normalize_url("HTTPS://EXAMPLE.COM", &NormalizeOptions::default()).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/");
/// ```
pub fn normalize_url(raw: &str, opts: &NormalizeOptions) -> Result<NormalizedUrl, UrlError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| UrlError::Malformed(format!("{}: {}", trimmed, e)))?;
    Ok(canonicalize(url, opts))
}

/// Normalizes an absolute URL that must be crawlable (http/https with a host)
pub fn normalize_web_url(raw: &str, opts: &NormalizeOptions) -> Result<NormalizedUrl, UrlError> {
    let url = normalize_url(raw, opts)?;
    if !WEB_SCHEMES.contains(&url.as_url().scheme()) {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.as_url().scheme()
        )));
    }
    if url.host().is_none() {
        return Err(UrlError::MissingDomain);
    }
    Ok(url)
}

fn canonicalize(mut url: Url, opts: &NormalizeOptions) -> NormalizedUrl {
    if !opts.keep_fragment || url.fragment() == Some("") {
        url.set_fragment(None);
    }

    if !opts.keep_query {
        url.set_query(None);
    } else if opts.strip_tracking_params && has_tracking_param(&url) {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    if url.query() == Some("") {
        url.set_query(None);
    }

    NormalizedUrl(url)
}

fn has_tracking_param(url: &Url) -> bool {
    url.query_pairs().any(|(key, _)| is_tracking_param(&key))
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
