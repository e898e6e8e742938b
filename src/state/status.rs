//! Fetch and link status values recorded in reports
//!
//! Every per-page and per-link failure ends up as one of these values rather
//! than as an error, so a report can always be produced.

use std::fmt;

/// Outcome of loading a page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    /// HTTP status code reported for the page
    Status(u16),

    /// The page loaded but its status could not be determined
    Unverified,

    /// robots.txt disallows the page; it was not loaded
    Blocked,

    /// The renderer failed (timeout, connection error...)
    Error(String),
}

impl FetchStatus {
    /// Returns the numeric status code, if any
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }

    /// Returns true if the page loaded with a non-error status
    pub fn is_success(&self) -> bool {
        match self {
            Self::Status(code) => *code < 400,
            Self::Unverified => true,
            Self::Blocked | Self::Error(_) => false,
        }
    }

    /// Returns true if the page was skipped because of robots.txt
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked)
    }

    /// Returns the error detail, if any
    pub fn error_detail(&self) -> Option<&str> {
        match self {
            Self::Error(reason) => Some(reason),
            _ => None,
        }
    }

    /// Converts to the short label stored in reports
    pub fn label(&self) -> String {
        match self {
            Self::Status(code) => code.to_string(),
            Self::Unverified => "unverified".to_string(),
            Self::Blocked => "blocked".to_string(),
            Self::Error(_) => "ERR".to_string(),
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(reason) => write!(f, "ERR ({})", reason),
            other => f.write_str(&other.label()),
        }
    }
}

/// Outcome of resolving one link
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    /// Final HTTP status after following redirects
    Status(u16),

    /// Timeout, connection or redirect failure; reported as `ERR`
    Error { reason: String },

    /// Resolution was not attempted (disabled, malformed or non-web URL)
    NotResolved,

    /// Not resolved because the per-page link cap was reached
    SkippedPageLimit,

    /// Not resolved because the run-wide link cap was reached
    SkippedTotalLimit,
}

impl LinkStatus {
    /// Returns the numeric status code, if any
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }

    /// Returns true for `ERR` and HTTP status codes of 400 and above
    pub fn is_broken(&self) -> bool {
        match self {
            Self::Status(code) => *code >= 400,
            Self::Error { .. } => true,
            _ => false,
        }
    }

    /// Returns true if the link was dropped by a link cap
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::SkippedPageLimit | Self::SkippedTotalLimit)
    }

    /// Returns the error detail, if any
    pub fn error_detail(&self) -> Option<&str> {
        match self {
            Self::Error { reason } => Some(reason),
            _ => None,
        }
    }

    /// Converts to the label stored in reports; None when never resolved
    pub fn label(&self) -> Option<String> {
        match self {
            Self::NotResolved => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "{}", code),
            Self::Error { .. } => f.write_str("ERR"),
            Self::NotResolved => Ok(()),
            Self::SkippedPageLimit => f.write_str("skipped: per-page limit"),
            Self::SkippedTotalLimit => f.write_str("skipped: total limit"),
        }
    }
}
