//! Quote-Harvest: an authenticated, paginated quote crawler
//!
//! This crate logs into a quotes site, walks its "next page" chain one page at
//! a time, extracts every quote on each page, appends the results to a JSON
//! document after every page, and can produce a data-quality report over the
//! finished dataset.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Quote-Harvest operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Rate limited (HTTP 429) at {url}")]
    RateLimited { url: String },

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Site unreachable at {url}: {reason}")]
    SiteUnreachable { url: String, reason: String },

    #[error("Login failed for user '{username}'")]
    LoginFailed { username: String },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScrapeError {
    /// Returns true for network/HTTP failures worth retrying with backoff
    ///
    /// Rate-limit responses are excluded; they have their own backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Timeout { .. } | Self::Status { .. }
        )
    }

    /// Returns true if the server answered HTTP 429
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Field extraction errors
///
/// Raised when a required field of a record cannot be selected. The page
/// parser catches these per record and drops the offending record.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Missing selector: {selector}")]
    MissingElement { selector: String },

    #[error("Missing attribute '{attr}' for selector: {selector}")]
    MissingAttribute { selector: String, attr: String },

    #[error("Empty value for required field '{field}'")]
    EmptyField { field: &'static str },

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Cannot resolve link '{href}': {source}")]
    InvalidUrl {
        href: String,
        source: ::url::ParseError,
    },
}

/// Result type alias for Quote-Harvest operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for extraction operations
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport};
pub use model::{PageEntry, Quote, Tag};
pub use state::CrawlState;
