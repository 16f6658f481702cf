use crate::config::types::{Config, HttpConfig, OutputConfig, RetryConfig, SelectorConfig, SiteConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_http_config(&config.http)?;
    validate_retry_config(&config.retry)?;
    validate_selector_config(&config.selectors)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the target site and credentials
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", config.base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.username.is_empty() {
        return Err(ConfigError::Validation("username cannot be empty".to_string()));
    }

    if config.password.is_empty() {
        return Err(ConfigError::Validation("password cannot be empty".to_string()));
    }

    if config.csrf_field.is_empty() {
        return Err(ConfigError::Validation("csrf_field cannot be empty".to_string()));
    }

    if config.logged_in_marker.trim().is_empty() {
        return Err(ConfigError::Validation(
            "logged_in_marker cannot be empty".to_string(),
        ));
    }

    validate_domain_string(&config.review_site_domain)?;

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation("user_agent cannot be empty".to_string()));
    }

    Ok(())
}

/// Validates retry and pacing bounds
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    check_range("base_delay_ms", config.base_delay_ms, "max_delay_ms", config.max_delay_ms)?;
    check_range(
        "rate_limit_initial_ms",
        config.rate_limit_initial_ms,
        "rate_limit_max_ms",
        config.rate_limit_max_ms,
    )?;
    check_range(
        "page_delay_min_ms",
        config.page_delay_min_ms,
        "page_delay_max_ms",
        config.page_delay_max_ms,
    )?;
    Ok(())
}

/// A delay pair must be non-zero and ordered
fn check_range(low_name: &str, low: u64, high_name: &str, high: u64) -> Result<(), ConfigError> {
    if low == 0 {
        return Err(ConfigError::Validation(format!("{} must be > 0", low_name)));
    }

    if low > high {
        return Err(ConfigError::Validation(format!(
            "{} ({}ms) cannot exceed {} ({}ms)",
            low_name, low, high_name, high
        )));
    }

    Ok(())
}

/// Validates that every selector compiles
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    for (name, selector) in [
        ("quote", &config.quote),
        ("text", &config.text),
        ("author", &config.author),
        ("author-link", &config.author_link),
        ("tag", &config.tag),
        ("next-page", &config.next_page),
    ] {
        Selector::parse(selector).map_err(|e| {
            ConfigError::InvalidSelector(format!("{} selector '{}': {:?}", name, selector, e))
        })?;
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_path.is_empty() {
        return Err(ConfigError::Validation("data_path cannot be empty".to_string()));
    }

    if config.report_path.is_empty() {
        return Err(ConfigError::Validation("report_path cannot be empty".to_string()));
    }

    if matches!(config.log_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "log_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates a bare domain such as `goodreads.com`
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::Validation(
            "review_site_domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' is malformed",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' must contain at least one dot (e.g., 'goodreads.com')",
            domain
        )));
    }

    Ok(())
}
