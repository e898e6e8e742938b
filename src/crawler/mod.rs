//! Crawler module for page traversal and link resolution
//!
//! This module contains the core crawling logic, including:
//! - The breadth-first frontier with page and depth budgets
//! - Link resolution over HTTP with per-page and run-wide caps
//! - The page renderer, screenshot and session interfaces
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod renderer;
mod resolver;
mod scheduler;
mod visitor;

pub use coordinator::{run_crawl, CancelHandle, Coordinator};
pub(crate) use coordinator::robots_gate;
pub use fetcher::{build_http_client, describe_error, resolve_link, Resolution};
pub use parser::{parse_html, sanitize_text, ParsedPage, LINK_TEXT_MAX, TITLE_MAX};
pub use renderer::{
    ElementLocator, HttpRenderer, NoScreenshots, PageRenderer, RawAnchor, RenderError,
    RenderedPage, ScreenshotCapturer, SessionGate, StdinGate,
};
pub use resolver::{LinkResolver, PageLinks, ResolvedLink, SourcePage};
pub use scheduler::{CrawlTask, EnqueueOutcome, Frontier};
pub use visitor::{PageVisitor, Visit};
