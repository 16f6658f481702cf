//! URL helpers for Quote-Harvest
//!
//! Link resolution, page-number derivation and host matching used by the
//! extractor, the page parser, the writer and the QA report.

use url::Url;

/// Resolves an `href` against `base` into an absolute URL string
///
/// # Examples
///
/// ```
/// use url::Url;
/// use quote_harvest::url::resolve_link;
///
/// let base = Url::parse("https://quotes.toscrape.com/page/2/").unwrap();
/// assert_eq!(
///     resolve_link(&base, "/author/Albert-Einstein").unwrap(),
///     "https://quotes.toscrape.com/author/Albert-Einstein"
/// );
/// assert_eq!(
///     resolve_link(&base, "/page/3/").unwrap(),
///     "https://quotes.toscrape.com/page/3/"
/// );
/// ```
pub fn resolve_link(base: &Url, href: &str) -> Result<String, url::ParseError> {
    base.join(href.trim()).map(String::from)
}

/// Derives a page number from the trailing path segment of a page URL
///
/// Trailing slashes are ignored. Anything that is not a plain integer, such
/// as the site root, maps to page 1.
///
/// # Examples
///
/// ```
/// use quote_harvest::url::page_number;
///
/// assert_eq!(page_number("https://quotes.toscrape.com/page/4/"), 4);
/// assert_eq!(page_number("https://quotes.toscrape.com/page/4"), 4);
/// assert_eq!(page_number("https://quotes.toscrape.com/"), 1);
/// ```
pub fn page_number(page_url: &str) -> i64 {
    let last = page_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    match last.parse::<i64>() {
        Ok(number) => number,
        Err(_) => {
            tracing::debug!("No valid page number in {}; defaulting to 1", page_url);
            1
        }
    }
}

/// Checks whether a URL's host is `domain` or one of its subdomains
///
/// # Examples
///
/// ```
/// use url::Url;
/// use quote_harvest::url::host_matches;
///
/// let url = Url::parse("https://www.goodreads.com/author/show/9810").unwrap();
/// assert!(host_matches(&url, "goodreads.com"));
/// assert!(!host_matches(&url, "reads.com"));
/// ```
pub fn host_matches(url: &Url, domain: &str) -> bool {
    match url.host_str() {
        Some(host) => {
            let host = host.to_lowercase();
            let domain = domain.to_lowercase();
            host == domain || host.ends_with(&format!(".{}", domain))
        }
        None => false,
    }
}

/// Returns true if `value` looks like an absolute HTTP(S) URL
pub fn is_http_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => (url.scheme() == "http" || url.scheme() == "https") && url.has_host(),
        Err(_) => false,
    }
}
