//! Records produced by the crawl
//!
//! These types define the shape of the JSON dataset: an array of
//! [`PageEntry`] values, each holding the [`Quote`]s found on one page.

use serde::{Deserialize, Serialize};

/// A tag attached to a quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag label, never empty
    pub name: String,

    /// Absolute URL of the tag's listing page
    pub url: String,
}

/// A single quote record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Quote text with stray quotation artifacts trimmed
    pub text: String,

    pub author: String,

    /// Absolute URL of the author's page
    pub author_url: String,

    /// Tags in page order; may be empty
    pub tags: Vec<Tag>,

    /// Review-site link found on the author page, or an empty string
    pub goodreads_url: String,
}

/// One crawled page and the quotes extracted from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    /// Page number taken from the URL's trailing path segment
    pub page: i64,

    pub url: String,

    pub quotes: Vec<Quote>,
}

impl PageEntry {
    /// Builds an entry for `url`, deriving the page number from it
    pub fn new(url: &str, quotes: Vec<Quote>) -> Self {
        Self {
            page: crate::url::page_number(url),
            url: url.to_string(),
            quotes,
        }
    }
}
