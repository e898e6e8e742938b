use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Returns
///
/// * `Some(String)` - The lowercase host, without port
/// * `None` - If the URL has no host (e.g. `mailto:`)
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_link_audit::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM:8443/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the `scheme://host[:port]` key identifying a robots.txt scope
///
/// robots.txt applies per origin, so the explicit port is part of the key
/// and two schemes on the same host get separate entries.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_link_audit::url::origin_key;
///
/// let url = Url::parse("https://example.com/a/b?q=1").unwrap();
/// assert_eq!(origin_key(&url), Some("https://example.com".to_string()));
///
/// let url = Url::parse("http://localhost:8080/").unwrap();
/// assert_eq!(origin_key(&url), Some("http://localhost:8080".to_string()));
/// ```
pub fn origin_key(url: &Url) -> Option<String> {
    let host = extract_domain(url)?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
