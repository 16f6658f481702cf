//! Storage traits and error types
//!
//! This module defines the trait interface for page sinks and associated
//! error types.

use crate::model::{PageEntry, Quote};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for incremental page sinks
///
/// The orchestrator hands every scraped page to a `PageStore` as soon as the
/// page is parsed, so already-collected data survives a later failure.
pub trait PageStore {
    /// Appends one page's quotes
    ///
    /// # Arguments
    ///
    /// * `page_url` - URL the quotes were scraped from
    /// * `quotes` - Quotes extracted from the page, possibly empty
    ///
    /// # Returns
    ///
    /// The entry that was appended
    fn append_page(&mut self, page_url: &str, quotes: &[Quote]) -> StorageResult<PageEntry>;

    /// Loads every page stored so far, in append order
    fn load_pages(&self) -> StorageResult<Vec<PageEntry>>;
}
