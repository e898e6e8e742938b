use serde::{Deserialize, Serialize};

/// Main configuration structure for Site-Link-Audit
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare: Option<CompareConfig>,
}

impl Config {
    /// Builds a configuration with defaults everywhere except the start URL
    pub fn for_start_url(start_url: &str) -> Self {
        Self {
            crawl: CrawlConfig {
                start_url: start_url.to_string(),
                ..CrawlConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Crawl traversal and scope configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlConfig {
    /// Seed URL the crawl starts from
    pub start_url: String,

    /// Maximum number of pages dequeued and recorded
    pub max_pages: u32,

    /// Maximum number of links resolved per page
    pub max_links_per_page: u32,

    /// Maximum number of links resolved across the whole run
    pub max_total_links: u32,

    /// Maximum crawl depth from the seed (seed is depth 0)
    pub max_depth: u32,

    /// Minimum time between two page fetches on the same host (milliseconds)
    pub delay_ms: u64,

    /// Only enqueue links classified as internal
    pub same_domain_only: bool,

    /// Treat subdomains of the seed host as internal
    pub include_subdomains: bool,

    /// Keep query strings during normalization
    pub keep_query: bool,

    /// Drop well-known tracking parameters from kept query strings
    pub strip_tracking_params: bool,

    /// Record fragment-only links and keep fragments as distinct targets
    pub include_fragments: bool,

    /// Case-insensitive regex; only matching URLs are crawled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_include: Option<String>,

    /// Case-insensitive regex; matching URLs are never crawled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_exclude: Option<String>,

    /// Open the seed once and wait for operator confirmation before crawling
    pub pause_on_first: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            max_pages: 30,
            max_links_per_page: 300,
            max_total_links: 3000,
            max_depth: 2,
            delay_ms: 500,
            same_domain_only: true,
            include_subdomains: false,
            keep_query: false,
            strip_tracking_params: false,
            include_fragments: false,
            pattern_include: None,
            pattern_exclude: None,
            pause_on_first: false,
        }
    }
}

/// Network behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NetworkConfig {
    /// Timeout for link resolution, robots.txt and page fetches (milliseconds)
    pub timeout_ms: u64,

    /// Maximum redirect hops followed while resolving a link
    pub max_redirects: u32,

    /// Obey robots.txt (false means ignore it entirely)
    pub respect_robots: bool,

    /// Resolve every link over HTTP to capture its final URL and status
    pub resolve_links: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 8000,
            max_redirects: 10,
            respect_robots: true,
            resolve_links: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserAgentConfig {
    /// Name of the crawler (also the robots.txt product token)
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SiteLinkAudit".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Path to the SQLite report database
    pub database_path: String,

    /// Path to the markdown summary file
    pub summary_path: String,

    /// Capture a cropped screenshot for each resolved link
    pub screenshots: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "site_links_report.db".to_string(),
            summary_path: "site_links_report.md".to_string(),
            screenshots: false,
        }
    }
}

/// Baseline-vs-upgraded comparison configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CompareConfig {
    /// Start URL of the baseline (old) site
    pub baseline_url: String,

    /// Base URL of the upgraded (new) site
    pub upgraded_url: String,

    /// Which link URL the diff is keyed by
    #[serde(default)]
    pub compare_by: CompareBy,
}

/// Key used to match links between baseline and upgraded pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompareBy {
    /// Post-redirect URL (falls back to the absolute URL)
    #[default]
    FinalUrl,
    /// Normalized absolute href
    AbsoluteUrl,
}
