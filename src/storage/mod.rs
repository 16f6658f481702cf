//! Storage module for persisting crawl data
//!
//! This module handles writing scraped pages to disk, including:
//! - The `PageStore` trait the orchestrator writes through
//! - The JSON file implementation used by the binary
//! - Clearing output left over from a previous run

mod json;
mod traits;

pub use json::JsonPageStore;
pub use traits::{PageStore, StorageError, StorageResult};

use std::path::Path;

/// Deletes every file and subdirectory inside `dir`
///
/// A missing directory is not an error. Entries that cannot be removed are
/// logged and skipped.
///
/// # Returns
///
/// The number of entries removed
pub fn clear_output_dir(dir: &Path) -> StorageResult<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(StorageError::Io {
                path: dir.display().to_string(),
                source: e,
            })
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let result = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };

        match result {
            Ok(()) => removed += 1,
            Err(e) => tracing::error!("Failed to delete {}: {}", path.display(), e),
        }
    }

    tracing::debug!("Cleared {} entries from {}", removed, dir.display());
    Ok(removed)
}
