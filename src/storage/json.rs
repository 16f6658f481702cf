use crate::model::{PageEntry, Quote};
use crate::storage::traits::{PageStore, StorageError, StorageResult};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// JSON file page store
///
/// Keeps the dataset as a single pretty-printed JSON array of page entries.
/// Every append reads the whole file, pushes one entry and rewrites the file,
/// so the document is valid JSON between pages.
#[derive(Debug, Clone)]
pub struct JsonPageStore {
    path: PathBuf,
}

impl JsonPageStore {
    /// Creates a store backed by `path`; the file is created on first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn write_pages(&self, pages: &[PageEntry]) -> StorageResult<()> {
        let mut buffer = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
        pages.serialize(&mut serializer)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        std::fs::write(&self.path, buffer).map_err(|e| self.io_error(e))?;
        tracing::debug!("Wrote {} page entries to {}", pages.len(), self.path.display());
        Ok(())
    }
}

impl PageStore for JsonPageStore {
    fn append_page(&mut self, page_url: &str, quotes: &[Quote]) -> StorageResult<PageEntry> {
        tracing::debug!("Appending data for page URL: {}", page_url);

        let mut pages = self.load_pages()?;
        let entry = PageEntry::new(page_url, quotes.to_vec());
        pages.push(entry.clone());

        tracing::info!(
            "Appending data for page {} with {} quotes",
            entry.page,
            entry.quotes.len()
        );
        self.write_pages(&pages)?;

        Ok(entry)
    }

    fn load_pages(&self) -> StorageResult<Vec<PageEntry>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        match serde_json::from_str::<Vec<PageEntry>>(&content) {
            Ok(pages) => {
                tracing::debug!("Loaded existing data with {} entries", pages.len());
                Ok(pages)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to decode existing JSON file {}. Starting with empty data. Error: {}",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }
}
