/// Crawl state definitions for the orchestrator's state machine
///
/// A run moves `Login -> CrawlPage -> Done`, or `Login -> Failed` when the
/// site is unreachable or authentication fails.
use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Active States =====
    /// Checking reachability and authenticating
    Login,

    /// Walking the page chain
    CrawlPage,

    // ===== Terminal States =====
    /// The page chain ended (last page, loop detected, or page unavailable)
    Done,

    /// The run was aborted before crawling (unreachable site or login failure)
    Failed,
}

impl CrawlState {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if this state represents a completed crawl
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        matches!(
            (self, next),
            (Self::Login, Self::CrawlPage)
                | (Self::Login, Self::Failed)
                | (Self::CrawlPage, Self::Done)
        )
    }

    /// Short lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::CrawlPage => "crawl_page",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
