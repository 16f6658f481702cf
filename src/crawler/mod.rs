//! Crawler module for logging in and walking the quote pages
//!
//! This module contains the core crawling logic, including:
//! - The shared HTTP session and login
//! - Listing-page parsing and per-record field extraction
//! - Retry, rate-limit backoff and pacing
//! - Overall crawl coordination

mod auth;
mod coordinator;
mod extractor;
mod fetcher;
mod parser;
mod retry;
mod select;

pub use auth::{Authenticator, LoginMarker};
pub use coordinator::{Coordinator, CrawlReport, StopReason};
pub use extractor::{clean_quote_text, find_review_link, QuoteExtractor, QuoteFields};
pub use fetcher::{build_http_client, Session};
pub use parser::{unvisited, ParsedPage, QuotePageParser};
pub use retry::{backoff_delay, classify_retry, RateLimitBackoff, RetryPolicy, JITTER_RATIO};
pub use select::{element_text, safe_select, Lookup, Query, Selectable};

use crate::config::Config;

/// Runs a complete crawl writing to the configured JSON file
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the session and check the site is reachable
/// 2. Log in
/// 3. Scrape every page of the chain, appending each to the output file
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran to the end of the chain
/// * `Err(ScrapeError)` - Setup, reachability or login failed
pub async fn crawl(config: Config) -> crate::Result<CrawlReport> {
    Coordinator::new(config)?.run().await
}
