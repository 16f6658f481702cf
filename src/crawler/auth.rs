//! Session authentication
//!
//! Logs into the site through its CSRF-protected login form and checks
//! whether the shared session is still logged in.

use crate::config::SiteConfig;
use crate::crawler::fetcher::Session;
use crate::crawler::select::{safe_select, Lookup, Query};
use crate::ScrapeError;
use scraper::Html;
use url::Url;

/// Predicate telling a logged-in page apart from an anonymous one
///
/// The check is a plain substring match on the response body; the marker
/// text is site specific (quotes.toscrape.com shows a "Logout" link).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginMarker(String);

impl LoginMarker {
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    pub fn is_logged_in(&self, body: &str) -> bool {
        body.contains(&self.0)
    }
}

/// Owns the crawl session and performs the login handshake
#[derive(Debug, Clone)]
pub struct Authenticator {
    session: Session,
    login_url: Url,
    csrf_field: String,
    csrf_query: Query,
    marker: LoginMarker,
}

impl Authenticator {
    /// Creates an authenticator for the site described by `site`
    pub fn new(session: Session, site: &SiteConfig) -> Result<Self, ScrapeError> {
        let login_url = session.base_url().join(&site.login_path)?;
        let csrf_query = Query::parse(&format!(r#"input[name="{}"]"#, site.csrf_field))?;

        Ok(Self {
            session,
            login_url,
            csrf_field: site.csrf_field.clone(),
            csrf_query,
            marker: LoginMarker::new(site.logged_in_marker.clone()),
        })
    }

    /// The shared session, for the parser and extractor
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetches the site root once to make sure the site answers at all
    pub async fn check_reachable(&self) -> Result<(), ScrapeError> {
        let root = self.session.base_url().as_str();
        match self.session.get_text(root).await {
            Ok(_) => {
                tracing::info!("Initial request successful");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Initial request failed: {}", e);
                Err(ScrapeError::SiteUnreachable {
                    url: root.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Logs in with `username` and `password`
    ///
    /// Fetches the login form, reads its CSRF token, posts the credentials and
    /// checks the response for the logged-in marker.
    ///
    /// # Returns
    ///
    /// `true` if the session is now logged in. Network errors, a missing
    /// token and a rejected login all yield `false`.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        let token = match self.fetch_csrf_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!("Failed to retrieve CSRF token: {}", e);
                return false;
            }
        };

        let form = [
            (self.csrf_field.as_str(), token.as_str()),
            ("username", username),
            ("password", password),
        ];

        let body = match self.session.post_form(self.login_url.as_str(), &form).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Login POST request failed: {}", e);
                return false;
            }
        };

        let success = self.marker.is_logged_in(&body);
        if success {
            tracing::info!("Login successful for user: {}", username);
        } else {
            tracing::warn!("Login failed. Logged-in marker not found in response.");
        }
        success
    }

    /// Checks whether the session is still logged in
    ///
    /// Re-fetches the site root and looks for the logged-in marker. Errors
    /// yield `false`.
    pub async fn is_authenticated(&self) -> bool {
        match self.session.get_text(self.session.base_url().as_str()).await {
            Ok(body) => {
                let authenticated = self.marker.is_logged_in(&body);
                tracing::info!(
                    "Session is {}authenticated",
                    if authenticated { "" } else { "not " }
                );
                authenticated
            }
            Err(e) => {
                tracing::warn!("Failed to verify authentication: {}", e);
                false
            }
        }
    }

    async fn fetch_csrf_token(&self) -> Result<String, ScrapeError> {
        let body = self.session.get_text(self.login_url.as_str()).await?;
        let document = Html::parse_document(&body);
        let token = safe_select(&document, &self.csrf_query, Some("value"), Lookup::Required)?;
        Ok(token.unwrap_or_default())
    }
}
