//! Per-run robots.txt cache entries

use crate::robots::ParsedRobots;
use std::time::Duration;

/// Robots.txt outcome cached for one origin
///
/// Entries are created on first need and reused for the rest of the run;
/// they are never refreshed mid-crawl. The crawl delay for the gate's agent
/// is looked up once, when the entry is created.
#[derive(Debug, Clone)]
pub struct CachedRobots {
    rules: ParsedRobots,
    crawl_delay: Option<Duration>,
}

impl CachedRobots {
    /// Creates an entry for the given product token
    pub fn new(rules: ParsedRobots, user_agent: &str) -> Self {
        let crawl_delay = rules.crawl_delay(user_agent);
        Self { rules, crawl_delay }
    }

    /// The parsed rules
    pub fn rules(&self) -> &ParsedRobots {
        &self.rules
    }

    /// Checks if a URL is allowed for the given product token
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        self.rules.is_allowed(url, user_agent)
    }

    /// `Crawl-delay` for the agent the entry was created for
    pub fn crawl_delay(&self) -> Option<Duration> {
        self.crawl_delay
    }
}
