//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: The orchestrator's phase (login, crawling, done, failed)
//! - `CrawlProgress`: Visited pages, counters and pacing for the current run
//! - `PageDelay`: The adaptive delay between pages

mod crawl_state;
mod progress;

// Re-export main types
pub use crawl_state::CrawlState;
pub use progress::{CrawlProgress, PageDelay};
