//! Fault-tolerant CSS selection
//!
//! `Selectable` is the one capability the extractor, parser and
//! authenticator need from an HTML tree: first match and all matches of a
//! query. `safe_select` layers required-versus-optional lookup on top of it.

use crate::{ExtractError, ExtractResult};
use scraper::{ElementRef, Html, Selector};

/// A compiled CSS selector that remembers its source text for error messages
#[derive(Debug, Clone)]
pub struct Query {
    raw: String,
    selector: Selector,
}

impl Query {
    /// Compiles `raw` into a selector
    pub fn parse(raw: &str) -> ExtractResult<Self> {
        let selector = Selector::parse(raw).map_err(|e| ExtractError::InvalidSelector {
            selector: raw.to_string(),
            message: format!("{:?}", e),
        })?;

        Ok(Self {
            raw: raw.to_string(),
            selector,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

/// Anything that can be searched with a [`Query`]
pub trait Selectable {
    /// First descendant matching `query`
    fn select_first(&self, query: &Query) -> Option<ElementRef<'_>>;

    /// Every descendant matching `query`, in document order
    fn select_all(&self, query: &Query) -> Vec<ElementRef<'_>>;
}

impl Selectable for Html {
    fn select_first(&self, query: &Query) -> Option<ElementRef<'_>> {
        self.select(query.selector()).next()
    }

    fn select_all(&self, query: &Query) -> Vec<ElementRef<'_>> {
        self.select(query.selector()).collect()
    }
}

impl<'a> Selectable for ElementRef<'a> {
    fn select_first(&self, query: &Query) -> Option<ElementRef<'_>> {
        self.select(query.selector()).next()
    }

    fn select_all(&self, query: &Query) -> Vec<ElementRef<'_>> {
        self.select(query.selector()).collect()
    }
}

/// Whether a missing element or attribute is an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Required,
    Optional,
}

/// Collapsed text content of an element, trimmed
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Selects text or an attribute from the first element matching `query`
///
/// With `attr` unset the element's trimmed text is returned, otherwise the
/// attribute's value.
///
/// # Returns
///
/// * `Ok(Some(value))` - The element (and attribute) was found
/// * `Ok(None)` - Nothing found and the lookup is optional
/// * `Err(ExtractError)` - Nothing found and the lookup is required
pub fn safe_select<S: Selectable + ?Sized>(
    root: &S,
    query: &Query,
    attr: Option<&str>,
    lookup: Lookup,
) -> ExtractResult<Option<String>> {
    let Some(element) = root.select_first(query) else {
        if lookup == Lookup::Required {
            tracing::warn!("Missing selector: {}", query.as_str());
            return Err(ExtractError::MissingElement {
                selector: query.as_str().to_string(),
            });
        }
        return Ok(None);
    };

    let Some(attr) = attr else {
        return Ok(Some(element_text(&element)));
    };

    match element.value().attr(attr) {
        Some(value) => Ok(Some(value.to_string())),
        None if lookup == Lookup::Required => {
            tracing::warn!("Missing attribute '{}' for selector: {}", attr, query.as_str());
            Err(ExtractError::MissingAttribute {
                selector: query.as_str().to_string(),
                attr: attr.to_string(),
            })
        }
        None => Ok(None),
    }
}
