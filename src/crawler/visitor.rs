//! Robots check, politeness wait and render for a single page

use crate::crawler::renderer::{PageRenderer, RenderError, RenderedPage};
use crate::robots::RobotsGate;
use crate::state::Politeness;
use crate::url::NormalizedUrl;
use std::sync::Arc;

/// What happened when a page was visited
#[derive(Debug)]
pub enum Visit {
    /// robots.txt disallows the page; nothing was fetched
    Blocked,

    /// The renderer failed
    Failed(RenderError),

    /// The page loaded
    Loaded(RenderedPage),
}

/// Visits pages on behalf of a crawl loop
///
/// Owns the robots gate and the per-host politeness state. Callers must call
/// [`PageVisitor::finish`] once they are done processing a visited page, so
/// the next page on the same host waits from that point.
pub struct PageVisitor {
    renderer: Arc<dyn PageRenderer>,
    robots: RobotsGate,
    politeness: Politeness,
}

impl PageVisitor {
    pub fn new(renderer: Arc<dyn PageRenderer>, robots: RobotsGate, politeness: Politeness) -> Self {
        Self {
            renderer,
            robots,
            politeness,
        }
    }

    /// The renderer pages are loaded with
    pub fn renderer(&self) -> &Arc<dyn PageRenderer> {
        &self.renderer
    }

    /// Returns true if robots.txt allows the page
    pub async fn is_allowed(&self, url: &NormalizedUrl) -> bool {
        self.robots.is_allowed(url).await
    }

    /// Checks robots.txt, waits out the host delay, then renders the page
    pub async fn visit(&mut self, url: &NormalizedUrl) -> Visit {
        if !self.robots.is_allowed(url).await {
            tracing::info!("Blocked by robots.txt: {}", url);
            return Visit::Blocked;
        }

        let host = url.host().unwrap_or_default();
        if self.robots.is_enabled() {
            let delay = self.robots.crawl_delay(url).await;
            self.politeness.set_robots_delay(host, delay);
        }
        self.politeness.wait_turn(host).await;

        match self.renderer.load(url.as_url()).await {
            Ok(page) => Visit::Loaded(page),
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", url, e);
                Visit::Failed(e)
            }
        }
    }

    /// Marks the end of processing for a visited page
    pub fn finish(&mut self, url: &NormalizedUrl) {
        if let Some(host) = url.host() {
            self.politeness.finish(host);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::renderer::RawAnchor;
    use crate::state::FetchStatus;
    use crate::url::{normalize_url, NormalizeOptions};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};
    use url::Url;

    #[derive(Default)]
    struct CountingRenderer(AtomicUsize);

    #[async_trait]
    impl PageRenderer for CountingRenderer {
        async fn load(&self, url: &Url) -> Result<RenderedPage, RenderError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(RenderedPage {
                final_url: url.clone(),
                title: String::new(),
                fetch_status: FetchStatus::Status(200),
                anchors: Vec::<RawAnchor>::new(),
            })
        }
    }

    fn url(s: &str) -> NormalizedUrl {
        normalize_url(s, &NormalizeOptions::default()).unwrap()
    }

    #[tokio::test]
    async fn test_delay_applies_per_host() {
        let renderer = Arc::new(CountingRenderer::default());
        let mut visitor = PageVisitor::new(
            renderer.clone(),
            RobotsGate::disabled(),
            Politeness::new(Duration::from_millis(150)),
        );

        let a1 = url("https://a.example.com/1");
        assert!(matches!(visitor.visit(&a1).await, Visit::Loaded(_)));
        visitor.finish(&a1);

        // another host does not wait
        let start = Instant::now();
        let b = url("https://b.example.com/1");
        visitor.visit(&b).await;
        visitor.finish(&b);
        assert!(start.elapsed() < Duration::from_millis(100));

        // same host waits out the delay
        let start = Instant::now();
        visitor.visit(&url("https://a.example.com/2")).await;
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert_eq!(renderer.0.load(Ordering::SeqCst), 3);
    }
}
