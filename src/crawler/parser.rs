//! Listing-page parser
//!
//! This module turns one listing page into quote records and finds the
//! link to the following page:
//! - Record containers are extracted one by one; a broken record is dropped
//! - The "next" link is resolved against the current page URL
//! - A "next" link pointing at an already visited page is treated as the end

use crate::config::Config;
use crate::crawler::extractor::{QuoteExtractor, QuoteFields};
use crate::crawler::fetcher::Session;
use crate::crawler::select::{safe_select, Lookup, Query, Selectable};
use crate::model::Quote;
use crate::url::resolve_link;
use crate::{ExtractResult, ScrapeError};
use scraper::Html;
use std::collections::HashSet;
use url::Url;

/// One fetched listing page
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPage {
    pub quotes: Vec<Quote>,
    /// Absolute URL of the following page, `None` on the last page
    pub next: Option<String>,
}

/// Parses listing pages of the quotes site
#[derive(Debug, Clone)]
pub struct QuotePageParser {
    session: Session,
    extractor: QuoteExtractor,
    quote_query: Query,
    next_query: Query,
}

impl QuotePageParser {
    /// Creates a parser sharing `session`, with selectors from `config`
    pub fn new(session: Session, config: &Config) -> Result<Self, ScrapeError> {
        let extractor = QuoteExtractor::new(
            session.clone(),
            &config.selectors,
            config.site.review_site_domain.clone(),
        )?;

        Ok(Self {
            session,
            extractor,
            quote_query: Query::parse(&config.selectors.quote)?,
            next_query: Query::parse(&config.selectors.next_page)?,
        })
    }

    /// Fetches `page_url` and extracts every quote on it
    ///
    /// Records that fail extraction are logged and skipped, so a page with no
    /// usable records yields an empty list.
    ///
    /// # Errors
    ///
    /// Fetch failures propagate; `ScrapeError::RateLimited` marks a 429.
    pub async fn parse_quotes(&self, page_url: &str) -> Result<Vec<Quote>, ScrapeError> {
        Ok(self.parse_page(page_url).await?.quotes)
    }

    /// Fetches `page_url` once and extracts both its quotes and its "next" link
    ///
    /// # Errors
    ///
    /// Same as [`parse_quotes`](Self::parse_quotes); an unparseable
    /// `page_url` gives `ScrapeError::UrlParse`.
    pub async fn parse_page(&self, page_url: &str) -> Result<ParsedPage, ScrapeError> {
        let current = Url::parse(page_url)?;
        let body = self.session.get_text(page_url).await?;
        let (records, next) = self.extract_page(&body, &current);

        let mut quotes = Vec::new();
        for (index, fields) in records.into_iter().enumerate() {
            match fields {
                Ok(fields) => quotes.push(self.extractor.enrich(fields).await),
                Err(e) => tracing::warn!(
                    "Skipping record {} on {}: {}",
                    index + 1,
                    page_url,
                    e
                ),
            }
        }

        tracing::info!("Parsed {} quotes from {}", quotes.len(), page_url);
        Ok(ParsedPage { quotes, next })
    }

    /// Synchronous half of `parse_page`; the document never outlives it
    fn extract_page(
        &self,
        body: &str,
        current: &Url,
    ) -> (Vec<ExtractResult<QuoteFields>>, Option<String>) {
        let document = Html::parse_document(body);
        let records = self.extract_records(&document);
        let next = self.next_link_in(&document, current);
        (records, next)
    }

    fn extract_records(&self, document: &Html) -> Vec<ExtractResult<QuoteFields>> {
        document
            .select_all(&self.quote_query)
            .iter()
            .map(|record| self.extractor.extract_fields(record))
            .collect()
    }

    /// Fetches `current_url` and returns the absolute URL of its "next" link
    ///
    /// # Returns
    ///
    /// * `Ok(Some(url))` - The page links to a following page
    /// * `Ok(None)` - This is the last page
    /// * `Err(ScrapeError)` - The current page could not be fetched
    pub async fn next_link(&self, current_url: &str) -> Result<Option<String>, ScrapeError> {
        let current = Url::parse(current_url)?;
        let body = self.session.get_text(current_url).await?;
        Ok(self.find_next_link(&body, &current))
    }

    /// Like [`next_link`](Self::next_link), but yields `None` for a page in `seen`
    pub async fn next_page_url(
        &self,
        current_url: &str,
        seen: &HashSet<String>,
    ) -> Result<Option<String>, ScrapeError> {
        Ok(unvisited(self.next_link(current_url).await?, seen))
    }

    /// Finds and resolves the "next" link in a listing page
    pub fn find_next_link(&self, body: &str, current: &Url) -> Option<String> {
        let document = Html::parse_document(body);
        self.next_link_in(&document, current)
    }

    fn next_link_in(&self, document: &Html, current: &Url) -> Option<String> {
        let href = match safe_select(document, &self.next_query, Some("href"), Lookup::Optional) {
            Ok(Some(href)) => href,
            Ok(None) => {
                tracing::debug!("No next page link on {}", current);
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to read next page link on {}: {}", current, e);
                return None;
            }
        };

        match resolve_link(current, &href) {
            Ok(next) => Some(next),
            Err(e) => {
                tracing::warn!("Cannot resolve next page link '{}' on {}: {}", href, current, e);
                None
            }
        }
    }
}

/// Drops a "next" link that points back into `seen`
pub fn unvisited(next: Option<String>, seen: &HashSet<String>) -> Option<String> {
    match next {
        Some(next) if seen.contains(&next) => {
            tracing::warn!("Loop detected: next page {} was already visited", next);
            None
        }
        next => next,
    }
}
