use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Tracks the politeness state of one host
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of pages fetched from this host in the current crawl
    pub request_count: u32,

    /// When processing of the previous page on this host finished
    pub last_finished: Option<Instant>,

    /// Crawl-delay requested by the host's robots.txt
    pub robots_delay: Option<Duration>,
}

impl HostState {
    /// Creates a new HostState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the delay that applies to this host
    ///
    /// The larger of the configured delay and the robots.txt Crawl-delay.
    pub fn effective_delay(&self, configured: Duration) -> Duration {
        match self.robots_delay {
            Some(robots) => configured.max(robots),
            None => configured,
        }
    }

    /// Checks if a page on this host may be fetched now
    pub fn can_request(&self, configured: Duration, now: Instant) -> bool {
        self.time_until_next_request(configured, now).is_none()
    }

    /// Calculates the time until the next fetch may start
    ///
    /// Returns None if a fetch can start now, or the duration to wait
    /// otherwise.
    pub fn time_until_next_request(&self, configured: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_finished?;
        let delay = self.effective_delay(configured);
        let elapsed = now.saturating_duration_since(last);
        if elapsed >= delay {
            None
        } else {
            Some(delay - elapsed)
        }
    }

    /// Records that processing of a page on this host finished
    pub fn record_finish(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_finished = Some(now);
    }
}

/// Per-host politeness tracker
///
/// The delay is measured from the end of the previous page's processing on
/// the same host to the start of the next render, so pages on different
/// hosts do not wait on each other.
#[derive(Debug, Clone)]
pub struct Politeness {
    delay: Duration,
    hosts: HashMap<String, HostState>,
}

impl Politeness {
    /// Creates a tracker with the configured minimum delay
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            hosts: HashMap::new(),
        }
    }

    /// Returns the configured minimum delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records the robots.txt Crawl-delay for a host
    pub fn set_robots_delay(&mut self, host: &str, delay: Option<Duration>) {
        self.hosts.entry(host.to_string()).or_default().robots_delay = delay;
    }

    /// Returns how long to wait before fetching from `host`
    pub fn wait_time(&self, host: &str, now: Instant) -> Option<Duration> {
        self.hosts
            .get(host)
            .and_then(|state| state.time_until_next_request(self.delay, now))
    }

    /// Sleeps until a fetch from `host` is allowed
    pub async fn wait_turn(&self, host: &str) {
        if let Some(wait) = self.wait_time(host, Instant::now()) {
            tracing::trace!("Waiting {:?} before next request to {}", wait, host);
            tokio::time::sleep(wait).await;
        }
    }

    /// Records the end of a page's processing on `host`
    pub fn finish(&mut self, host: &str) {
        self.hosts
            .entry(host.to_string())
            .or_default()
            .record_finish(Instant::now());
    }

    /// Returns the state tracked for a host
    pub fn host(&self, host: &str) -> Option<&HostState> {
        self.hosts.get(host)
    }
}
