use std::collections::HashSet;
use std::time::Duration;

/// Adaptive delay between consecutive pages
///
/// Halves after a successful page and doubles after a failed one, clamped to
/// `[min, max]`. The delay starts at the floor.
#[derive(Debug, Clone)]
pub struct PageDelay {
    current: Duration,
    min: Duration,
    max: Duration,
}

impl PageDelay {
    /// Creates a delay clamped to `[min, max]`, starting at `min`
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            current: min,
            min,
            max,
        }
    }

    /// The delay to sleep before the next page
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Speeds up after a page succeeded
    pub fn on_success(&mut self) {
        self.current = (self.current / 2).max(self.min);
    }

    /// Slows down after a page failed
    pub fn on_failure(&mut self) {
        self.current = self.current.saturating_mul(2).min(self.max);
    }
}

/// Transient state of one crawl run
///
/// Holds everything the orchestrator needs between pages. Nothing here is
/// persisted; a new run always starts from an empty progress.
#[derive(Debug, Clone)]
pub struct CrawlProgress {
    /// Page URLs already attempted, for loop detection
    visited: HashSet<String>,

    /// Page URLs in the order they were attempted
    visit_order: Vec<String>,

    /// Pages parsed and handed to the store
    pub pages_scraped: u32,

    /// Pages abandoned after retries or an unexpected error
    pub pages_failed: u32,

    /// Quotes extracted across all scraped pages
    pub quotes_collected: usize,

    /// Adaptive pause between pages
    pub delay: PageDelay,
}

impl CrawlProgress {
    pub fn new(delay: PageDelay) -> Self {
        Self {
            visited: HashSet::new(),
            visit_order: Vec::new(),
            pages_scraped: 0,
            pages_failed: 0,
            quotes_collected: 0,
            delay,
        }
    }

    /// Returns true if `url` was already attempted in this run
    pub fn has_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Marks `url` as attempted; returns false if it already was
    pub fn mark_visited(&mut self, url: &str) -> bool {
        if self.visited.insert(url.to_string()) {
            self.visit_order.push(url.to_string());
            true
        } else {
            false
        }
    }

    /// The visited set, used as the cycle guard for next-page lookups
    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    /// Visited URLs in crawl order
    pub fn visit_order(&self) -> &[String] {
        &self.visit_order
    }

    /// Records a successfully scraped page and speeds up pacing
    pub fn record_success(&mut self, quotes: usize) {
        self.pages_scraped += 1;
        self.quotes_collected += quotes;
        self.delay.on_success();
    }

    /// Records an abandoned page and slows down pacing
    pub fn record_failure(&mut self) {
        self.pages_failed += 1;
        self.delay.on_failure();
    }
}
