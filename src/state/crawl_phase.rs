/// Crawl phase definitions for the frontier state machine
///
/// `Idle -> Running -> {Completed, Exhausted, LimitReached, Cancelled}`.
/// All terminal phases are successful terminations.
use std::fmt;

/// Represents the current phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Seeded, nothing dequeued yet
    #[default]
    Idle,

    /// At least one task has been dequeued
    Running,

    // ===== Terminal Phases =====
    /// Frontier drained exactly as the page budget was spent
    Completed,

    /// Frontier drained with page budget remaining
    Exhausted,

    /// Page or link budget hit; the remaining frontier was discarded
    LimitReached,

    /// Stopped externally (operator interrupt)
    Cancelled,
}

impl CrawlPhase {
    /// Returns true if the crawl has stopped
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Idle | Self::Running)
    }

    /// Checks whether moving to `next` is a legal transition
    ///
    /// Terminal phases only transition to themselves. `Idle` may stop
    /// directly (e.g. cancellation before the first page).
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        match (self, next) {
            (a, b) if *a == b => true,
            (Self::Idle, _) => true,
            (Self::Running, Self::Idle) => false,
            (Self::Running, _) => true,
            _ => false,
        }
    }

    /// Converts the phase to its report string
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Exhausted => "exhausted",
            Self::LimitReached => "limit_reached",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a phase from its report string
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "exhausted" => Some(Self::Exhausted),
            "limit_reached" => Some(Self::LimitReached),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns all phases
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::Running,
            Self::Completed,
            Self::Exhausted,
            Self::LimitReached,
            Self::Cancelled,
        ]
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Exhausted => "Exhausted",
            Self::LimitReached => "Limit Reached",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}
