use crate::ConfigError;
use regex::{Regex, RegexBuilder};

/// Checks if a candidate host belongs to the seed host
///
/// With `include_subdomains`, the seed host itself and any host ending in
/// `.<seed>` match (`blog.example.com`, `api.v2.example.com`). Without it
/// only the exact seed host matches. Both inputs are expected lowercase.
///
/// # Examples
///
/// ```
/// use site_link_audit::url::host_in_scope;
///
/// assert!(host_in_scope("example.com", "example.com", false));
/// assert!(!host_in_scope("example.com", "blog.example.com", false));
/// assert!(host_in_scope("example.com", "blog.example.com", true));
/// assert!(!host_in_scope("example.com", "myexample.com", true));
/// ```
pub fn host_in_scope(seed_host: &str, candidate: &str, include_subdomains: bool) -> bool {
    if seed_host.is_empty() || candidate.is_empty() {
        return false;
    }
    if candidate == seed_host {
        return true;
    }
    include_subdomains
        && candidate.len() > seed_host.len() + 1
        && candidate.ends_with(seed_host)
        && candidate.as_bytes()[candidate.len() - seed_host.len() - 1] == b'.'
}

/// Precompiled include/exclude URL filters
///
/// Both patterns are case-insensitive and tested against the normalized URL
/// string. An empty pattern counts as unset.
#[derive(Debug, Clone, Default)]
pub struct UrlPatterns {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl UrlPatterns {
    /// Compiles the optional include and exclude patterns
    ///
    /// # Returns
    ///
    /// * `Ok(UrlPatterns)` - Compiled filters
    /// * `Err(ConfigError::InvalidPattern)` - A pattern failed to compile
    pub fn compile(include: Option<&str>, exclude: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self {
            include: compile_pattern("pattern-include", include)?,
            exclude: compile_pattern("pattern-exclude", exclude)?,
        })
    }

    /// Returns true if the URL passes both filters
    ///
    /// Exclude wins when both patterns match.
    pub fn allows(&self, url: &str) -> bool {
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(url) {
                return false;
            }
        }
        match &self.include {
            Some(include) => include.is_match(url),
            None => true,
        }
    }

    /// Returns true if neither pattern is set
    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }
}

fn compile_pattern(name: &str, pattern: Option<&str>) -> Result<Option<Regex>, ConfigError> {
    match pattern {
        Some(p) if !p.trim().is_empty() => RegexBuilder::new(p)
            .case_insensitive(true)
            .build()
            .map(Some)
            .map_err(|e| ConfigError::InvalidPattern(format!("{} '{}': {}", name, p, e))),
        _ => Ok(None),
    }
}
