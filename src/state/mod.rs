//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `FetchStatus` / `LinkStatus`: recorded outcome of a page load or link resolution
//! - `CrawlPhase`: the frontier's state machine
//! - `HostState` / `Politeness`: per-host delay tracking

mod crawl_phase;
mod host_state;
mod status;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use host_state::{HostState, Politeness};
pub use status::{FetchStatus, LinkStatus};
