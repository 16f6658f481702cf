//! Plain-text QA report
//!
//! Renders a [`QaSummary`] as the human-readable report written next to the
//! dataset.

use crate::output::stats::QaSummary;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const RULE_WIDTH: usize = 40;

/// Formats a QA summary as a plain-text report
pub fn format_report(summary: &QaSummary) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    // Writing into a String cannot fail
    let _ = writeln!(out, "QA REPORT");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(
        out,
        "Generated: {}",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(
        out,
        "Pages: {}, Records: {}\n",
        summary.total_pages, summary.total_records
    );

    let _ = writeln!(out, "Field Coverage (% of non-empty values):");
    for (field, pct) in &summary.field_coverage {
        let _ = writeln!(out, "- {}: {}%", field, pct);
    }

    let _ = writeln!(out, "\nRecord Validation:");
    let _ = writeln!(out, "- Valid records: {}", summary.valid_records);
    let _ = writeln!(out, "- Invalid records: {}", summary.invalid_records);

    let _ = writeln!(out, "\nUniqueness Check (Page Field):");
    if summary.duplicate_pages.is_empty() {
        let _ = writeln!(out, "- All pages are unique.");
    } else {
        let _ = writeln!(out, "- Duplicate pages found: {:?}", summary.duplicate_pages);
    }

    let _ = writeln!(out, "\nURL Validation:");
    for (field, invalid) in &summary.invalid_urls {
        if *invalid == 0 {
            let _ = writeln!(out, "- All {} values are valid URLs", field);
        } else {
            let _ = writeln!(out, "- Invalid {}: {} occurrences", field, invalid);
        }
    }

    out
}

/// Writes the formatted report to `path`, creating parent directories
pub fn write_report(summary: &QaSummary, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format_report(summary))
}
