//! HTTP session and fetching
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the cookie-bearing HTTP client
//! - GET requests for listing, login and author pages
//! - Form POSTs for the login step
//! - Error classification (timeouts, rate limiting, other non-2xx statuses)

use crate::config::HttpConfig;
use crate::ScrapeError;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// The client keeps a cookie store so the session cookie set at login is sent
/// with every later request.
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .cookie_store(true)
        .https_only(config.https_only)
        .gzip(true)
        .brotli(true)
        .build()
}

/// The crawl's HTTP session
///
/// One `Session` is created per run and owned by the authenticator. Clones
/// are handles onto the same underlying client and cookie jar, which is how
/// the page parser and the field extractor share the logged-in session.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    base_url: Url,
}

impl Session {
    /// Creates a session for the site rooted at `base_url`
    pub fn new(base_url: Url, config: &HttpConfig) -> Result<Self, ScrapeError> {
        let client = build_http_client(config).map_err(|source| ScrapeError::Http {
            url: base_url.to_string(),
            source,
        })?;

        Ok(Self { client, base_url })
    }

    /// Root URL of the site, used to resolve relative links
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GETs `url` and returns the body of a 2xx response
    ///
    /// # Errors
    ///
    /// * `ScrapeError::RateLimited` - The server answered 429
    /// * `ScrapeError::Status` - Any other non-2xx status
    /// * `ScrapeError::Timeout` / `ScrapeError::Http` - Transport failures
    pub async fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        tracing::trace!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_send_error(url, e))?;

        read_body(url, response).await
    }

    /// POSTs `form` as `application/x-www-form-urlencoded` to `url`
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<String, ScrapeError> {
        tracing::trace!("POST {}", url);
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| classify_send_error(url, e))?;

        read_body(url, response).await
    }
}

/// Rejects non-2xx responses, then reads the body as text
async fn read_body(url: &str, response: Response) -> Result<String, ScrapeError> {
    check_status(url, response.status())?;

    response
        .text()
        .await
        .map_err(|e| classify_send_error(url, e))
}

/// Maps a response status to the crawler's error taxonomy
fn check_status(url: &str, status: StatusCode) -> Result<(), ScrapeError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ScrapeError::RateLimited {
            url: url.to_string(),
        });
    }

    if !status.is_success() {
        return Err(ScrapeError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(())
}

/// Classifies a transport error
fn classify_send_error(url: &str, error: reqwest::Error) -> ScrapeError {
    if error.is_timeout() {
        ScrapeError::Timeout {
            url: url.to_string(),
        }
    } else {
        ScrapeError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
