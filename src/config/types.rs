use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Quote-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Target site and credentials
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Root URL of the site; the crawl starts here
    #[serde(rename = "base-url")]
    pub base_url: String,

    pub username: String,

    pub password: String,

    /// Path of the login form, relative to the base URL
    #[serde(rename = "login-path", default = "default_login_path")]
    pub login_path: String,

    /// Name of the hidden CSRF token input in the login form
    #[serde(rename = "csrf-field", default = "default_csrf_field")]
    pub csrf_field: String,

    /// Substring that only appears in pages served to a logged-in session
    #[serde(rename = "logged-in-marker", default = "default_logged_in_marker")]
    pub logged_in_marker: String,

    /// Host of the external review site linked from author pages
    #[serde(rename = "review-site-domain", default = "default_review_site_domain")]
    pub review_site_domain: String,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Refuse plain-HTTP URLs
    #[serde(rename = "https-only", default)]
    pub https_only: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            https_only: false,
        }
    }
}

/// Retry, rate-limit and pacing configuration (all durations in milliseconds)
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Generic retries per page; 429 responses do not count against this
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(rename = "base-delay-ms", default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(rename = "rate-limit-initial-ms", default = "default_rate_limit_initial_ms")]
    pub rate_limit_initial_ms: u64,

    #[serde(rename = "rate-limit-max-ms", default = "default_rate_limit_max_ms")]
    pub rate_limit_max_ms: u64,

    /// Floor of the adaptive delay between pages
    #[serde(rename = "page-delay-min-ms", default = "default_page_delay_min_ms")]
    pub page_delay_min_ms: u64,

    /// Ceiling of the adaptive delay between pages
    #[serde(rename = "page-delay-max-ms", default = "default_page_delay_max_ms")]
    pub page_delay_max_ms: u64,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn rate_limit_initial(&self) -> Duration {
        Duration::from_millis(self.rate_limit_initial_ms)
    }

    pub fn rate_limit_max(&self) -> Duration {
        Duration::from_millis(self.rate_limit_max_ms)
    }

    pub fn page_delay_min(&self) -> Duration {
        Duration::from_millis(self.page_delay_min_ms)
    }

    pub fn page_delay_max(&self) -> Duration {
        Duration::from_millis(self.page_delay_max_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            rate_limit_initial_ms: default_rate_limit_initial_ms(),
            rate_limit_max_ms: default_rate_limit_max_ms(),
            page_delay_min_ms: default_page_delay_min_ms(),
            page_delay_max_ms: default_page_delay_max_ms(),
        }
    }
}

/// CSS selectors used to pick records and fields out of the site's markup
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Record container on a listing page
    #[serde(default = "default_quote_selector")]
    pub quote: String,

    #[serde(default = "default_text_selector")]
    pub text: String,

    #[serde(default = "default_author_selector")]
    pub author: String,

    #[serde(rename = "author-link", default = "default_author_link_selector")]
    pub author_link: String,

    #[serde(default = "default_tag_selector")]
    pub tag: String,

    #[serde(rename = "next-page", default = "default_next_page_selector")]
    pub next_page: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            quote: default_quote_selector(),
            text: default_text_selector(),
            author: default_author_selector(),
            author_link: default_author_link_selector(),
            tag: default_tag_selector(),
            next_page: default_next_page_selector(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON dataset rewritten after every page
    #[serde(rename = "data-path", default = "default_data_path")]
    pub data_path: String,

    /// Path to the QA text report
    #[serde(rename = "report-path", default = "default_report_path")]
    pub report_path: String,

    /// Optional log file; logs go to stdout when unset
    #[serde(rename = "log-path", default)]
    pub log_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            report_path: default_report_path(),
            log_path: None,
        }
    }
}

fn default_login_path() -> String {
    "login".to_string()
}

fn default_csrf_field() -> String {
    "csrf_token".to_string()
}

fn default_logged_in_marker() -> String {
    "Logout".to_string()
}

fn default_review_site_domain() -> String {
    "goodreads.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("quote-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_rate_limit_initial_ms() -> u64 {
    1_000
}

fn default_rate_limit_max_ms() -> u64 {
    60_000
}

fn default_page_delay_min_ms() -> u64 {
    1_000
}

fn default_page_delay_max_ms() -> u64 {
    60_000
}

fn default_quote_selector() -> String {
    "div.quote".to_string()
}

fn default_text_selector() -> String {
    "span.text".to_string()
}

fn default_author_selector() -> String {
    "small.author".to_string()
}

fn default_author_link_selector() -> String {
    r#"a[href^="/author/"]"#.to_string()
}

fn default_tag_selector() -> String {
    "div.tags a.tag".to_string()
}

fn default_next_page_selector() -> String {
    "li.next > a".to_string()
}

fn default_data_path() -> String {
    "outputs/data.json".to_string()
}

fn default_report_path() -> String {
    "outputs/qa_report.txt".to_string()
}
