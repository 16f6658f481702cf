//! Field extraction for a single quote record
//!
//! Extraction is split in two phases so no parsed document is held across an
//! await point:
//! - `extract_fields` reads the record's own markup synchronously;
//! - `enrich` fetches the author page and looks up the review-site link.

use crate::config::SelectorConfig;
use crate::crawler::fetcher::Session;
use crate::crawler::select::{element_text, safe_select, Lookup, Query, Selectable};
use crate::model::{Quote, Tag};
use crate::url::{host_matches, resolve_link};
use crate::{ExtractError, ExtractResult};
use scraper::{ElementRef, Html};
use url::Url;

/// Remains of UTF-8 smart quotes decoded as Latin-1, stripped from both ends
/// of quote text. Correctly decoded curly quotes are part of the text.
const TEXT_ARTIFACTS: [char; 4] = ['â', '€', 'œ', '\u{9d}'];

/// Trims whitespace and mis-decoded quote artifacts from both ends of `raw`
///
/// # Examples
///
/// ```
/// use quote_harvest::crawler::clean_quote_text;
///
/// assert_eq!(clean_quote_text("  “Stay hungry.”  "), "“Stay hungry.”");
/// assert_eq!(clean_quote_text("â€œOdd encodingâ€\u{9d}"), "Odd encoding");
/// ```
pub fn clean_quote_text(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || TEXT_ARTIFACTS.contains(&c))
        .to_string()
}

/// Finds the first link on a page whose host is `domain` or a subdomain of it
///
/// Relative links are resolved against `page_url` first.
pub fn find_review_link(html: &str, page_url: &Url, domain: &str, links: &Query) -> Option<String> {
    let document = Html::parse_document(html);

    document
        .select_all(links)
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| page_url.join(href.trim()).ok())
        .find(|url| host_matches(url, domain))
        .map(String::from)
}

/// Fields read from a record's own markup, before enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteFields {
    pub text: String,
    pub author: String,
    pub author_url: String,
    pub tags: Vec<Tag>,
}

/// Extracts quote records from their container elements
#[derive(Debug, Clone)]
pub struct QuoteExtractor {
    session: Session,
    text: Query,
    author: Query,
    author_link: Query,
    tag: Query,
    any_link: Query,
    review_domain: String,
}

impl QuoteExtractor {
    pub fn new(
        session: Session,
        selectors: &SelectorConfig,
        review_domain: impl Into<String>,
    ) -> ExtractResult<Self> {
        Ok(Self {
            session,
            text: Query::parse(&selectors.text)?,
            author: Query::parse(&selectors.author)?,
            author_link: Query::parse(&selectors.author_link)?,
            tag: Query::parse(&selectors.tag)?,
            any_link: Query::parse("a[href]")?,
            review_domain: review_domain.into(),
        })
    }

    /// Reads text, author, author link and tags from one record container
    ///
    /// # Errors
    ///
    /// Returns an `ExtractError` when the text, author or author link is
    /// missing or empty. Broken tags are skipped instead.
    pub fn extract_fields(&self, record: &ElementRef<'_>) -> ExtractResult<QuoteFields> {
        let raw_text = safe_select(record, &self.text, None, Lookup::Required)?.unwrap_or_default();
        let text = clean_quote_text(&raw_text);
        if text.is_empty() {
            return Err(ExtractError::EmptyField { field: "text" });
        }

        let author = safe_select(record, &self.author, None, Lookup::Required)?.unwrap_or_default();
        if author.is_empty() {
            return Err(ExtractError::EmptyField { field: "author" });
        }

        let href = safe_select(record, &self.author_link, Some("href"), Lookup::Required)?
            .unwrap_or_default();
        let author_url = resolve_link(self.session.base_url(), &href)
            .map_err(|source| ExtractError::InvalidUrl { href, source })?;

        Ok(QuoteFields {
            text,
            author,
            author_url,
            tags: self.extract_tags(record),
        })
    }

    fn extract_tags(&self, record: &ElementRef<'_>) -> Vec<Tag> {
        let mut tags = Vec::new();

        for element in record.select_all(&self.tag) {
            let name = element_text(&element);
            let href = element.value().attr("href").map(str::trim).unwrap_or_default();

            if name.is_empty() || href.is_empty() {
                tracing::warn!("Skipping tag with missing name or href (name: '{}')", name);
                continue;
            }

            match resolve_link(self.session.base_url(), href) {
                Ok(url) => tags.push(Tag { name, url }),
                Err(e) => tracing::warn!("Skipping tag '{}' with bad href '{}': {}", name, href, e),
            }
        }

        tags
    }

    /// Completes a record with its review-site link
    pub async fn enrich(&self, fields: QuoteFields) -> Quote {
        let goodreads_url = self.lookup_review_url(&fields.author_url).await;

        Quote {
            text: fields.text,
            author: fields.author,
            author_url: fields.author_url,
            tags: fields.tags,
            goodreads_url,
        }
    }

    /// Fetches the author page and returns its review-site link
    ///
    /// Best effort: any failure is logged and yields an empty string.
    pub async fn lookup_review_url(&self, author_url: &str) -> String {
        let page_url = match Url::parse(author_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Invalid author URL {}: {}", author_url, e);
                return String::new();
            }
        };

        let body = match self.session.get_text(author_url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to fetch author page {}: {}", author_url, e);
                return String::new();
            }
        };

        match find_review_link(&body, &page_url, &self.review_domain, &self.any_link) {
            Some(url) => url,
            None => {
                tracing::warn!(
                    "No {} link found on author page {}",
                    self.review_domain,
                    author_url
                );
                String::new()
            }
        }
    }
}
