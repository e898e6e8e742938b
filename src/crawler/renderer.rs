//! Page renderer, screenshot capturer and session gate interfaces
//!
//! The crawl loop only talks to these traits, so a headless browser can be
//! plugged in without touching the frontier or the resolver. The built-in
//! [`HttpRenderer`] fetches static HTML with reqwest and does not run
//! scripts.

use crate::crawler::fetcher::describe_error;
use crate::crawler::parser::{parse_html, ParsedPage};
use crate::state::FetchStatus;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;

/// Identifies an anchor element on a rendered page
///
/// The index of the element among all `<a>` elements in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementLocator(pub usize);

/// An anchor element as the renderer saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAnchor {
    /// The `href` attribute, if present
    pub href: Option<String>,

    /// Text content of the element (not yet whitespace-collapsed)
    pub text: String,

    /// The `aria-label` attribute, if present
    pub aria_label: Option<String>,

    /// The `target` attribute
    pub target: String,

    /// The `rel` attribute
    pub rel: String,

    /// Where to find the element for screenshots
    pub locator: ElementLocator,
}

/// A loaded page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL the page landed on after redirects
    pub final_url: Url,

    /// Page title, empty if missing
    pub title: String,

    /// Status of the page load
    pub fetch_status: FetchStatus,

    /// Anchors in document order
    pub anchors: Vec<RawAnchor>,
}

/// Errors that can occur while loading a page
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Timed out loading {url}")]
    Timeout { url: String },

    #[error("Network error loading {url}: {message}")]
    Network { url: String, message: String },
}

impl RenderError {
    /// Short reason recorded in the page's fetch status
    pub fn reason(&self) -> String {
        match self {
            Self::Timeout { .. } => "timeout".to_string(),
            Self::Network { message, .. } => message.clone(),
        }
    }

    fn from_reqwest(url: &Url, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                message: describe_error(&e),
            }
        }
    }
}

/// Loads pages and reports their anchors
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Loads a page
    async fn load(&self, url: &Url) -> Result<RenderedPage, RenderError>;

    /// Opens the seed page for an operator session and returns where it landed
    ///
    /// Called once before the crawl when pause-on-first is enabled.
    async fn open_session(&self, url: &Url) -> Result<Url, RenderError> {
        Ok(url.clone())
    }
}

/// Captures a cropped image of an anchor element
#[async_trait]
pub trait ScreenshotCapturer: Send + Sync {
    /// Returns PNG bytes, or `None` if the element cannot be captured
    async fn capture(&self, page: &Url, locator: &ElementLocator) -> Option<Vec<u8>>;
}

/// Blocks once before the crawl until the operator is ready
#[async_trait]
pub trait SessionGate: Send + Sync {
    async fn confirm(&self, landing: &Url) -> std::io::Result<()>;
}

/// Screenshot capturer that never captures anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoScreenshots;

#[async_trait]
impl ScreenshotCapturer for NoScreenshots {
    async fn capture(&self, _page: &Url, _locator: &ElementLocator) -> Option<Vec<u8>> {
        None
    }
}

/// Session gate that waits for Enter on stdin
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinGate;

#[async_trait]
impl SessionGate for StdinGate {
    async fn confirm(&self, landing: &Url) -> std::io::Result<()> {
        println!("Opened {}", landing);
        println!("Log in or prepare the session, then press Enter to start crawling...");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
        Ok(())
    }
}

/// Static-HTML page renderer over reqwest
///
/// Reports the HTTP status of the final response. Non-HTML responses load
/// successfully with no anchors.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn load(&self, url: &Url) -> Result<RenderedPage, RenderError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| RenderError::from_reqwest(url, e))?;

        let final_url = response.url().clone();
        let status = response.status().as_u16();
        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(true, |ct| ct.contains("html"));

        let parsed = if is_html {
            let body = response
                .text()
                .await
                .map_err(|e| RenderError::from_reqwest(url, e))?;
            parse_html(&body)
        } else {
            tracing::debug!("Not HTML, no anchors extracted: {}", final_url);
            ParsedPage::default()
        };

        Ok(RenderedPage {
            final_url,
            title: parsed.title,
            fetch_status: FetchStatus::Status(status),
            anchors: parsed.anchors,
        })
    }
}
