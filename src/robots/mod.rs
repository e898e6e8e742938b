//! Robots.txt handling module
//!
//! This module fetches, parses and caches robots.txt files for the duration
//! of one crawl. The [`RobotsGate`] is owned by the crawl session; there is
//! no process-wide cache.

mod cache;
mod parser;

pub use cache::CachedRobots;
pub use parser::{ParsedRobots, MAX_CRAWL_DELAY};

use crate::url::{origin_key, NormalizedUrl};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};

/// Fetches and parses robots.txt for an origin
///
/// Any failure (network error, timeout, non-success status, unreadable
/// body) yields [`ParsedRobots::allow_all`].
///
/// # Arguments
///
/// * `client` - HTTP client carrying the User-Agent header and timeout
/// * `origin` - `scheme://host[:port]` of the site
pub async fn fetch_robots(client: &reqwest::Client, origin: &str) -> ParsedRobots {
    let robots_url = format!("{}/robots.txt", origin);

    let response = match client.get(&robots_url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}; allowing all", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    let status = response.status();
    if !status.is_success() {
        tracing::debug!("{} returned {}; allowing all", robots_url, status);
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}; allowing all", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}

async fn load_robots(client: &reqwest::Client, origin: &str, user_agent: &str) -> CachedRobots {
    let parsed = fetch_robots(client, origin).await;
    tracing::debug!(
        "Cached robots.txt for {} ({})",
        origin,
        if parsed.is_allow_all() { "allow all" } else { "rules" }
    );
    CachedRobots::new(parsed, user_agent)
}

type RobotsSlot = Arc<OnceCell<CachedRobots>>;

/// Per-run robots.txt policy gate
///
/// The first query for an origin fetches its robots.txt; concurrent callers
/// for the same origin wait on that single fetch. The outcome (including the
/// fail-open fallback) is reused for the rest of the run.
pub struct RobotsGate {
    /// `None` when robots.txt is ignored
    client: Option<reqwest::Client>,
    user_agent: String,
    cache: Mutex<HashMap<String, RobotsSlot>>,
}

impl RobotsGate {
    /// Creates a gate that respects robots.txt
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for robots.txt requests
    /// * `user_agent` - Product token matched against `User-agent` groups
    pub fn new(client: reqwest::Client, user_agent: impl Into<String>) -> Self {
        Self {
            client: Some(client),
            user_agent: user_agent.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a gate that allows everything without fetching
    pub fn disabled() -> Self {
        Self {
            client: None,
            user_agent: String::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if robots.txt is being respected
    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Checks whether the URL may be fetched
    pub async fn is_allowed(&self, url: &NormalizedUrl) -> bool {
        self.with_robots(url, |robots| robots.is_allowed(url.as_str(), &self.user_agent))
            .await
            .unwrap_or(true)
    }

    /// Returns the `Crawl-delay` that applies to the URL's origin
    pub async fn crawl_delay(&self, url: &NormalizedUrl) -> Option<Duration> {
        self.with_robots(url, |robots| robots.crawl_delay())
            .await
            .flatten()
    }

    /// Number of origins with a cache entry
    pub async fn cached_origins(&self) -> usize {
        self.cache.lock().await.len()
    }

    async fn with_robots<T>(
        &self,
        url: &NormalizedUrl,
        f: impl FnOnce(&CachedRobots) -> T,
    ) -> Option<T> {
        let client = self.client.as_ref()?;
        let origin = origin_key(url.as_url())?;

        // The map lock is only held to find or create the slot; the fetch
        // itself runs under the per-origin cell.
        let slot = {
            let mut cache = self.cache.lock().await;
            Arc::clone(cache.entry(origin.clone()).or_default())
        };

        let robots = slot
            .get_or_init(|| load_robots(client, &origin, &self.user_agent))
            .await;

        Some(f(robots))
    }
}
