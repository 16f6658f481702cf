//! Output module for the data-quality report
//!
//! This module handles:
//! - Reading a finished dataset back from disk
//! - Measuring field coverage, record validity, duplicates and URL quality
//! - Writing the plain-text QA report

mod report;
pub mod stats;

pub use report::{format_report, write_report};
pub use stats::QaSummary;

use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while producing the QA report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to read dataset {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to decode dataset: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Dataset {path} is not a JSON array of pages")]
    NotAnArray { path: String },

    #[error("Failed to write report {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Generates the QA report for a dataset
///
/// # Arguments
///
/// * `data_path` - The JSON dataset written by the crawl
/// * `report_path` - Where the plain-text report is written
///
/// # Returns
///
/// * `Ok(QaSummary)` - The measured summary, also written to `report_path`
/// * `Err(ReportError)` - The dataset could not be read or the report written
pub fn generate_report(data_path: &Path, report_path: &Path) -> ReportResult<QaSummary> {
    let content = std::fs::read_to_string(data_path).map_err(|source| ReportError::Read {
        path: data_path.display().to_string(),
        source,
    })?;

    let Value::Array(pages) = serde_json::from_str::<Value>(&content)? else {
        return Err(ReportError::NotAnArray {
            path: data_path.display().to_string(),
        });
    };

    let summary = QaSummary::from_pages(&pages);
    write_report(&summary, report_path).map_err(|source| ReportError::Write {
        path: report_path.display().to_string(),
        source,
    })?;

    tracing::info!(
        "QA report written to {} ({} records, {} invalid)",
        report_path.display(),
        summary.total_records,
        summary.invalid_records
    );
    Ok(summary)
}
