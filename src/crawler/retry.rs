//! Retry and backoff policy
//!
//! Two independent mechanisms protect a page fetch:
//! - generic failures (network errors, non-2xx statuses) get jittered
//!   exponential backoff and a bounded number of retries;
//! - HTTP 429 responses get their own escalating backoff that never counts
//!   against the retry budget.

use crate::config::RetryConfig;
use crate::ScrapeError;
use rand::Rng;
use std::time::Duration;

/// Upper bound of the random jitter, as a fraction of the backoff delay
pub const JITTER_RATIO: f64 = 0.1;

/// Computes a jittered exponential backoff delay
///
/// The delay is `min(base * 2^retry_count, max)` plus uniform jitter in
/// `[0, 10%]` of that value.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use quote_harvest::crawler::backoff_delay;
///
/// let delay = backoff_delay(2, Duration::from_secs(1), Duration::from_secs(10));
/// assert!(delay >= Duration::from_secs(4));
/// assert!(delay <= Duration::from_secs_f64(4.4));
/// ```
pub fn backoff_delay(retry_count: u32, base: Duration, max: Duration) -> Duration {
    // 2^64 already saturates any sane cap
    let exponent = retry_count.min(64) as i32;
    let delay = (base.as_secs_f64() * 2f64.powi(exponent)).min(max.as_secs_f64());

    let jitter = if delay > 0.0 {
        rand::rng().random_range(0.0..=delay * JITTER_RATIO)
    } else {
        0.0
    };

    Duration::from_secs_f64(delay + jitter)
}

/// Retry budget and delays for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Generic retries allowed per page
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// First wait after a 429
    pub rate_limit_initial: Duration,
    /// Ceiling for the 429 wait
    pub rate_limit_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            rate_limit_initial: config.rate_limit_initial(),
            rate_limit_max: config.rate_limit_max(),
        }
    }
}

impl RetryPolicy {
    /// Decides whether a failed attempt should be retried
    ///
    /// # Returns
    ///
    /// * `Some(delay)` - Wait this long, then retry
    /// * `None` - Give up: the budget is spent or the error is not transient
    pub fn classify(&self, error: &ScrapeError, retry_count: u32) -> Option<Duration> {
        if retry_count >= self.max_retries {
            tracing::warn!("Max retries reached. Will not retry.");
            return None;
        }

        if !error.is_transient() {
            return None;
        }

        let delay = backoff_delay(retry_count, self.base_delay, self.max_delay);
        tracing::info!(
            "Retrying after {:.2} seconds due to error: {}",
            delay.as_secs_f64(),
            error
        );
        Some(delay)
    }

    /// Fresh 429 backoff for a new page
    pub fn rate_limit_backoff(&self) -> RateLimitBackoff {
        RateLimitBackoff::new(self.rate_limit_initial, self.rate_limit_max)
    }
}

/// Decides whether a failed attempt should be retried, with default delays
///
/// Shorthand for [`RetryPolicy::classify`] on a policy with the given budget
/// and a 1 s base / 10 s cap.
pub fn classify_retry(error: &ScrapeError, retry_count: u32, max_retries: u32) -> Option<Duration> {
    RetryPolicy {
        max_retries,
        ..RetryPolicy::default()
    }
    .classify(error, retry_count)
}

/// Escalating backoff for consecutive HTTP 429 responses
///
/// Starts at the initial delay and doubles on every call up to the ceiling.
/// It has no attempt limit; a page that only ever sees 429s keeps waiting.
#[derive(Debug, Clone)]
pub struct RateLimitBackoff {
    next: Duration,
    max: Duration,
    hits: u32,
}

impl RateLimitBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            next: initial.min(max),
            max,
            hits: 0,
        }
    }

    /// Returns the wait for this 429 and escalates the next one
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2).min(self.max);
        self.hits += 1;
        delay
    }

    /// Number of 429 responses seen so far
    pub fn hits(&self) -> u32 {
        self.hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient() -> ScrapeError {
        ScrapeError::Status {
            url: "https://quotes.toscrape.com/page/2/".to_string(),
            status: 502,
        }
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_backoff_within_jitter_bounds() {
        let base = secs(1.0);
        let max = secs(10.0);

        for retry in 0..3u32 {
            let floor = 2f64.powi(retry as i32);
            for _ in 0..200 {
                let delay = backoff_delay(retry, base, max).as_secs_f64();
                assert!(delay >= floor - 1e-9, "retry {} gave {}", retry, delay);
                assert!(delay <= floor * 1.1 + 1e-9, "retry {} gave {}", retry, delay);
            }
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        for retry in [4u32, 5, 10, 40, 1_000] {
            let delay = backoff_delay(retry, secs(1.0), secs(10.0)).as_secs_f64();
            assert!(delay >= 10.0 - 1e-9);
            assert!(delay <= 11.0 + 1e-9);
        }
    }

    #[test]
    fn test_backoff_floor_is_non_decreasing() {
        // Jitter aside, the lower bound never shrinks as retries grow
        let mut previous = 0.0;
        for retry in 0..8u32 {
            let floor = (2f64.powi(retry as i32)).min(10.0);
            assert!(floor >= previous);
            let delay = backoff_delay(retry, secs(1.0), secs(10.0)).as_secs_f64();
            assert!(delay >= previous - 1e-9);
            previous = floor;
        }
    }

    #[test]
    fn test_zero_base_has_no_jitter() {
        assert_eq!(backoff_delay(3, Duration::ZERO, secs(10.0)), Duration::ZERO);
    }

    #[test]
    fn test_classify_retries_until_budget_spent() {
        for retry in 0..3 {
            assert!(classify_retry(&transient(), retry, 3).is_some());
        }
        assert!(classify_retry(&transient(), 3, 3).is_none());
        assert!(classify_retry(&transient(), 7, 3).is_none());
    }

    #[test]
    fn test_classify_gives_up_on_non_transient() {
        let err = ScrapeError::LoginFailed {
            username: "admin".to_string(),
        };
        assert!(classify_retry(&err, 0, 3).is_none());

        let rate_limited = ScrapeError::RateLimited {
            url: "https://quotes.toscrape.com/".to_string(),
        };
        assert!(classify_retry(&rate_limited, 0, 3).is_none());
    }

    #[test]
    fn test_policy_uses_configured_delays() {
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(15),
            ..RetryPolicy::default()
        };

        let first = policy.classify(&transient(), 0).unwrap();
        assert!(first >= Duration::from_millis(10) && first <= Duration::from_millis(11));

        let capped = policy.classify(&transient(), 1).unwrap();
        assert!(capped >= Duration::from_millis(15));

        assert!(policy.classify(&transient(), 2).is_none());
    }

    #[test]
    fn test_rate_limit_backoff_doubles_to_ceiling() {
        let mut backoff = RateLimitBackoff::new(secs(1.0), secs(60.0));
        let delays: Vec<u64> = (0..9).map(|_| backoff.next_delay().as_secs()).collect();

        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 60, 60, 60]);
        assert_eq!(backoff.hits(), 9);
    }

    #[test]
    fn test_rate_limit_backoff_resets_per_page() {
        let policy = RetryPolicy::default();

        let mut first_page = policy.rate_limit_backoff();
        first_page.next_delay();
        first_page.next_delay();

        let mut second_page = policy.rate_limit_backoff();
        assert_eq!(second_page.next_delay(), secs(1.0));
    }
}
