//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl state machine that coordinates:
//! - The reachability check and login
//! - Walking the "next page" chain with cycle detection
//! - Per-page retries, with separate handling for rate limiting
//! - Handing every scraped page to the page store
//! - Adaptive pacing between pages

use crate::config::Config;
use crate::crawler::auth::Authenticator;
use crate::crawler::fetcher::Session;
use crate::crawler::parser::{ParsedPage, QuotePageParser};
use crate::crawler::retry::RetryPolicy;
use crate::state::{CrawlProgress, CrawlState, PageDelay};
use crate::storage::{JsonPageStore, PageStore};
use crate::ScrapeError;
use std::fmt;
use url::Url;

/// Why the page loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last page had no "next" link
    LastPage,

    /// The "next" link led back to a page already visited
    LoopDetected,

    /// The "next" link could not be determined because the current page
    /// could not be fetched
    NextPageUnavailable,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::LastPage => "last page reached",
            Self::LoopDetected => "loop detected",
            Self::NextPageUnavailable => "next page unavailable",
        };
        write!(f, "{}", reason)
    }
}

/// Summary of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub state: CrawlState,
    pub stop_reason: StopReason,
    pub pages_scraped: u32,
    pub pages_failed: u32,
    pub quotes_collected: usize,
    /// Page URLs attempted, in crawl order
    pub visited: Vec<String>,
}

/// Main crawler coordinator structure
pub struct Coordinator<S: PageStore = JsonPageStore> {
    config: Config,
    auth: Authenticator,
    parser: QuotePageParser,
    policy: RetryPolicy,
    store: S,
    state: CrawlState,
    progress: CrawlProgress,
}

impl Coordinator<JsonPageStore> {
    /// Creates a coordinator writing to the JSON file named in `config`
    pub fn new(config: Config) -> Result<Self, ScrapeError> {
        let store = JsonPageStore::new(&config.output.data_path);
        Self::with_store(config, store)
    }
}

impl<S: PageStore> Coordinator<S> {
    /// Creates a coordinator writing every page to `store`
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run, in the `Login` state
    /// * `Err(ScrapeError)` - Bad base URL, selector or HTTP client setup
    pub fn with_store(config: Config, store: S) -> Result<Self, ScrapeError> {
        let base_url = Url::parse(&config.site.base_url)?;
        let session = Session::new(base_url, &config.http)?;

        let auth = Authenticator::new(session.clone(), &config.site)?;
        let parser = QuotePageParser::new(session, &config)?;
        let policy = RetryPolicy::from(&config.retry);
        let progress = CrawlProgress::new(PageDelay::new(
            config.retry.page_delay_min(),
            config.retry.page_delay_max(),
        ));

        Ok(Self {
            config,
            auth,
            parser,
            policy,
            store,
            state: CrawlState::Login,
            progress,
        })
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn progress(&self) -> &CrawlProgress {
        &self.progress
    }

    /// Runs the crawl to completion
    ///
    /// Logs in, then walks the page chain from the site root until the last
    /// page, a loop, or a page whose "next" link cannot be determined.
    ///
    /// # Errors
    ///
    /// Only start-up failures are fatal: `ScrapeError::SiteUnreachable` and
    /// `ScrapeError::LoginFailed`. The coordinator is left in `Failed` and
    /// nothing is written to the store.
    pub async fn run(&mut self) -> Result<CrawlReport, ScrapeError> {
        tracing::info!("Starting crawl of {}", self.config.site.base_url);
        let start_time = std::time::Instant::now();

        if let Err(e) = self.start().await {
            self.transition(CrawlState::Failed)?;
            return Err(e);
        }
        self.transition(CrawlState::CrawlPage)?;

        let stop_reason = self.crawl_pages().await;
        self.transition(CrawlState::Done)?;

        tracing::info!(
            "Crawl completed ({}): {} pages scraped, {} failed, {} quotes in {:?}",
            stop_reason,
            self.progress.pages_scraped,
            self.progress.pages_failed,
            self.progress.quotes_collected,
            start_time.elapsed()
        );

        Ok(CrawlReport {
            state: self.state,
            stop_reason,
            pages_scraped: self.progress.pages_scraped,
            pages_failed: self.progress.pages_failed,
            quotes_collected: self.progress.quotes_collected,
            visited: self.progress.visit_order().to_vec(),
        })
    }

    /// Reachability check followed by login
    async fn start(&self) -> Result<(), ScrapeError> {
        self.auth.check_reachable().await?;

        let username = &self.config.site.username;
        if !self.auth.login(username, &self.config.site.password).await {
            tracing::error!("Login failed. Exiting.");
            return Err(ScrapeError::LoginFailed {
                username: username.clone(),
            });
        }

        Ok(())
    }

    fn transition(&mut self, to: CrawlState) -> Result<(), ScrapeError> {
        if !self.state.can_transition_to(to) {
            return Err(ScrapeError::InvalidTransition {
                from: self.state,
                to,
            });
        }

        tracing::debug!("State {} -> {}", self.state, to);
        self.state = to;
        Ok(())
    }

    /// Walks the page chain until it ends
    async fn crawl_pages(&mut self) -> StopReason {
        let mut current = self.auth.session().base_url().to_string();

        loop {
            if !self.progress.mark_visited(&current) {
                tracing::warn!("Loop detected: {} was already visited. Stopping.", current);
                return StopReason::LoopDetected;
            }

            tracing::info!("Scraping page: {}", current);
            let next = match self.process_single_page(&current).await {
                Some(page) => {
                    self.progress.record_success(page.quotes.len());
                    Ok(page.next)
                }
                None => {
                    self.progress.record_failure();
                    let authenticated = self.auth.is_authenticated().await;
                    tracing::warn!(
                        "Page {} failed; session {} authenticated",
                        current,
                        if authenticated { "still" } else { "no longer" }
                    );
                    self.parser.next_link(&current).await
                }
            };

            let next = match next {
                Ok(Some(next)) => next,
                Ok(None) => {
                    tracing::info!("No next page found. Stopping.");
                    return StopReason::LastPage;
                }
                Err(e) => {
                    tracing::warn!("Cannot determine next page after {}: {}. Stopping.", current, e);
                    return StopReason::NextPageUnavailable;
                }
            };

            if self.progress.has_visited(&next) {
                tracing::warn!("Loop detected: next page {} was already visited. Stopping.", next);
                return StopReason::LoopDetected;
            }

            let delay = self.progress.delay.current();
            tracing::debug!(
                "Sleeping {:.2} seconds before {}",
                delay.as_secs_f64(),
                next
            );
            tokio::time::sleep(delay).await;

            current = next;
        }
    }

    /// Scrapes and stores one page, retrying as the policy allows
    ///
    /// 429 responses are retried indefinitely with their own backoff and do
    /// not consume the retry budget. A failed write is logged and the page
    /// still counts as scraped.
    ///
    /// # Returns
    ///
    /// The scraped page with its "next" link, or `None` if it was abandoned
    async fn process_single_page(&mut self, page_url: &str) -> Option<ParsedPage> {
        let mut retry_count = 0;
        let mut rate_limit = self.policy.rate_limit_backoff();

        loop {
            match self.parser.parse_page(page_url).await {
                Ok(page) => {
                    match self.store.append_page(page_url, &page.quotes) {
                        Ok(entry) => tracing::debug!(
                            "Stored page {} with {} quotes",
                            entry.page,
                            entry.quotes.len()
                        ),
                        Err(e) => tracing::error!("Failed to store page {}: {}", page_url, e),
                    }
                    return Some(page);
                }
                Err(e) if e.is_rate_limited() => {
                    let delay = rate_limit.next_delay();
                    tracing::warn!(
                        "Rate limited on {} (hit {}). Waiting {:.2} seconds.",
                        page_url,
                        rate_limit.hits(),
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => match self.policy.classify(&e, retry_count) {
                    Some(delay) => {
                        retry_count += 1;
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        tracing::error!("Failed to scrape {}: {}", page_url, e);
                        return None;
                    }
                },
            }
        }
    }
}
