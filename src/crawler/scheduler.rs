//! Breadth-first crawl frontier
//!
//! This module handles:
//! - The FIFO queue of crawl tasks
//! - The visited set (marked at enqueue time)
//! - Page budget and depth enforcement
//! - The frontier's phase transitions

use crate::state::CrawlPhase;
use crate::url::NormalizedUrl;
use std::collections::{HashSet, VecDeque};

/// A page waiting to be crawled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Fragment-free normalized URL of the page
    pub url: NormalizedUrl,

    /// Distance from the seed (the seed is 0)
    pub depth: u32,
}

/// Outcome of offering a discovered link to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Queued for crawling
    Enqueued,

    /// Already queued or processed
    AlreadySeen,

    /// The parent page is at the maximum depth
    DepthExceeded,

    /// Dequeued plus queued pages already fill the page budget
    PageBudgetFull,
}

/// BFS queue plus visited set plus limits
///
/// A URL is marked visited the moment it is enqueued, so the same page can
/// never be queued twice no matter how many pages link to it.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlTask>,
    visited: HashSet<NormalizedUrl>,
    max_pages: u32,
    max_depth: u32,
    pages_dequeued: u32,
    budget_refusals: u32,
    phase: CrawlPhase,
}

impl Frontier {
    /// Creates a frontier seeded with the start URL at depth 0
    pub fn new(seed: NormalizedUrl, max_pages: u32, max_depth: u32) -> Self {
        let seed = seed.without_fragment();
        let mut visited = HashSet::new();
        visited.insert(seed.clone());

        let mut queue = VecDeque::new();
        queue.push_back(CrawlTask {
            url: seed,
            depth: 0,
        });

        Self {
            queue,
            visited,
            max_pages,
            max_depth,
            pages_dequeued: 0,
            budget_refusals: 0,
            phase: CrawlPhase::Idle,
        }
    }

    /// Replaces the seed before the crawl starts
    ///
    /// Used when the operator session lands on a different URL than the
    /// configured start URL. Both URLs stay in the visited set.
    pub fn reseed(&mut self, seed: NormalizedUrl) {
        if self.phase != CrawlPhase::Idle {
            tracing::warn!("Ignoring reseed to {} after the crawl started", seed);
            return;
        }
        let seed = seed.without_fragment();
        self.visited.insert(seed.clone());
        self.queue.clear();
        self.queue.push_back(CrawlTask {
            url: seed,
            depth: 0,
        });
    }

    /// Dequeues the next task, or settles the terminal phase
    ///
    /// # Returns
    ///
    /// * `Some(CrawlTask)` - The next page in BFS order
    /// * `None` - The crawl is over; see [`Frontier::phase`]
    pub fn next_task(&mut self) -> Option<CrawlTask> {
        if self.phase.is_terminal() {
            return None;
        }

        if self.pages_dequeued >= self.max_pages || self.queue.is_empty() {
            let terminal = if self.pages_dequeued < self.max_pages {
                CrawlPhase::Exhausted
            } else if self.budget_refusals > 0 || !self.queue.is_empty() {
                CrawlPhase::LimitReached
            } else {
                CrawlPhase::Completed
            };
            self.queue.clear();
            self.transition(terminal);
            return None;
        }

        let task = self.queue.pop_front()?;
        self.pages_dequeued += 1;
        if self.phase == CrawlPhase::Idle {
            self.transition(CrawlPhase::Running);
        }
        Some(task)
    }

    /// Offers a link discovered on a page at `parent_depth`
    ///
    /// Only crawl-eligible links should be offered; scope is decided by the
    /// caller.
    pub fn offer(&mut self, url: &NormalizedUrl, parent_depth: u32) -> EnqueueOutcome {
        let url = url.without_fragment();

        if parent_depth >= self.max_depth {
            tracing::trace!("Not enqueued (depth): {}", url);
            return EnqueueOutcome::DepthExceeded;
        }
        if self.visited.contains(&url) {
            return EnqueueOutcome::AlreadySeen;
        }
        if self.pages_dequeued as usize + self.queue.len() >= self.max_pages as usize {
            self.budget_refusals += 1;
            tracing::trace!("Not enqueued (page budget): {}", url);
            return EnqueueOutcome::PageBudgetFull;
        }

        tracing::debug!("Enqueued at depth {}: {}", parent_depth + 1, url);
        self.visited.insert(url.clone());
        self.queue.push_back(CrawlTask {
            url,
            depth: parent_depth + 1,
        });
        EnqueueOutcome::Enqueued
    }

    /// Marks a URL as visited without queueing it
    ///
    /// Used for redirect landing pages so they are never rendered again.
    pub fn mark_visited(&mut self, url: &NormalizedUrl) -> bool {
        self.visited.insert(url.without_fragment())
    }

    /// Returns true if the URL was queued or processed
    pub fn is_visited(&self, url: &NormalizedUrl) -> bool {
        self.visited.contains(&url.without_fragment())
    }

    /// Stops the crawl because the run-wide link cap was hit
    pub fn limit_reached(&mut self) {
        if !self.phase.is_terminal() {
            self.queue.clear();
            self.transition(CrawlPhase::LimitReached);
        }
    }

    /// Stops the crawl on external request
    pub fn cancel(&mut self) {
        if !self.phase.is_terminal() {
            self.queue.clear();
            self.transition(CrawlPhase::Cancelled);
        }
    }

    /// Current phase
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Number of pages dequeued so far
    pub fn pages_dequeued(&self) -> u32 {
        self.pages_dequeued
    }

    /// Number of queued tasks
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn transition(&mut self, next: CrawlPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid phase transition {:?} -> {:?}",
            self.phase,
            next
        );
        if next.is_terminal() {
            tracing::info!(
                "Frontier finished: {} after {} pages",
                next,
                self.pages_dequeued
            );
        }
        self.phase = next;
    }
}
