//! Configuration module for Site-Link-Audit
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use site_link_audit::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("audit.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawl.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CompareBy, CompareConfig, Config, CrawlConfig, NetworkConfig, OutputConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, config_fingerprint, load_config, load_config_with_hash, read_config,
};
pub use validation::validate;
