//! Configuration module for Quote-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Only the `[site]` table is mandatory; every other table falls back to the
//! defaults for quotes.toscrape.com.
//!
//! # Example
//!
//! ```no_run
//! use quote_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawl starts at: {}", config.site.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, HttpConfig, OutputConfig, RetryConfig, SelectorConfig, SiteConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
