//! Data-quality statistics over a scraped dataset
//!
//! The dataset is read as plain JSON rather than through the typed model so
//! that a damaged or hand-edited file can still be measured.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Per-quote columns measured by the report, in report order
pub const FIELDS: [&str; 7] = [
    "page",
    "page_url",
    "text",
    "author",
    "author_url",
    "tags",
    "goodreads_url",
];

/// Columns checked for absolute URLs
pub const URL_FIELDS: [&str; 3] = ["page_url", "author_url", "goodreads_url"];

/// Quality summary of a dataset
#[derive(Debug, Clone)]
pub struct QaSummary {
    pub generated_at: DateTime<Utc>,

    /// Page entries in the file
    pub total_pages: usize,

    /// Quote rows across all pages
    pub total_records: usize,

    /// Percentage of rows where each field is present and non-empty,
    /// rounded to two decimals, in `FIELDS` order
    pub field_coverage: Vec<(&'static str, f64)>,

    pub valid_records: usize,
    pub invalid_records: usize,

    /// Page numbers that occur more than once, ascending
    pub duplicate_pages: Vec<i64>,

    /// Rows whose value is not an `http` URL, per `URL_FIELDS` column
    pub invalid_urls: Vec<(&'static str, usize)>,
}

impl QaSummary {
    /// Measures a dataset given as its top-level array of page entries
    pub fn from_pages(pages: &[Value]) -> Self {
        let rows = flatten(pages);

        let field_coverage = FIELDS
            .iter()
            .map(|&field| {
                let present = rows.iter().filter(|row| is_present(row.get(field))).count();
                (field, percentage(present, rows.len()))
            })
            .collect();

        let valid_records = rows.iter().filter(|row| is_valid_record(row)).count();

        let invalid_urls = URL_FIELDS
            .iter()
            .map(|&field| {
                let invalid = rows
                    .iter()
                    .filter(|row| !is_http_value(row.get(field)))
                    .count();
                (field, invalid)
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            total_pages: pages.len(),
            total_records: rows.len(),
            field_coverage,
            valid_records,
            invalid_records: rows.len() - valid_records,
            duplicate_pages: duplicate_pages(pages),
            invalid_urls,
        }
    }

    /// Coverage percentage of one field, if it is a measured column
    pub fn coverage(&self, field: &str) -> Option<f64> {
        self.field_coverage
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, pct)| *pct)
    }

    /// Invalid URL count of one column, if it is a measured column
    pub fn invalid_url_count(&self, field: &str) -> Option<usize> {
        self.invalid_urls
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, count)| *count)
    }
}

/// One row per quote, carrying its page's number and URL
fn flatten(pages: &[Value]) -> Vec<Map<String, Value>> {
    let mut rows = Vec::new();

    for page in pages {
        let page_number = page.get("page").cloned().unwrap_or(Value::Null);
        let page_url = page.get("url").cloned().unwrap_or(Value::Null);
        let Some(quotes) = page.get("quotes").and_then(Value::as_array) else {
            continue;
        };

        for quote in quotes {
            let mut row = Map::new();
            row.insert("page".to_string(), page_number.clone());
            row.insert("page_url".to_string(), page_url.clone());
            for field in &FIELDS[2..] {
                let value = quote.get(*field).cloned().unwrap_or(Value::Null);
                row.insert((*field).to_string(), value);
            }
            rows.push(row);
        }
    }

    rows
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(_) => true,
    }
}

fn is_http_value(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| s.starts_with("http"))
}

fn is_absolute_url(value: Option<&Value>) -> bool {
    value.and_then(Value::as_str).is_some_and(crate::url::is_http_url)
}

fn non_empty_str(value: Option<&Value>) -> bool {
    value.and_then(Value::as_str).is_some_and(|s| !s.is_empty())
}

/// Checks a row against the record rules of the dataset
fn is_valid_record(row: &Map<String, Value>) -> bool {
    let page_ok = row.get("page").and_then(Value::as_i64).is_some();
    let tags_ok = match row.get("tags") {
        Some(Value::Array(tags)) => tags
            .iter()
            .all(|tag| non_empty_str(tag.get("name")) && is_absolute_url(tag.get("url"))),
        _ => false,
    };
    let goodreads_ok = match row.get("goodreads_url").and_then(Value::as_str) {
        Some("") => true,
        Some(url) => crate::url::is_http_url(url),
        None => false,
    };

    page_ok
        && is_http_value(row.get("page_url"))
        && non_empty_str(row.get("text"))
        && non_empty_str(row.get("author"))
        && is_absolute_url(row.get("author_url"))
        && tags_ok
        && goodreads_ok
}

fn duplicate_pages(pages: &[Value]) -> Vec<i64> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for number in pages.iter().filter_map(|p| p.get("page").and_then(Value::as_i64)) {
        *counts.entry(number).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(number, _)| number)
        .collect()
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = part as f64 / total as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}
