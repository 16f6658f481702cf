//! Integration tests for the crawler
//!
//! These tests use wiremock to create a mock quotes site and run the full
//! crawl cycle end-to-end: login, page chain, author lookups and the JSON
//! output file.

use quote_harvest::config::{
    Config, HttpConfig, OutputConfig, RetryConfig, SelectorConfig, SiteConfig,
};
use quote_harvest::crawler::{Coordinator, StopReason};
use quote_harvest::model::PageEntry;
use quote_harvest::output::generate_report;
use quote_harvest::state::CrawlState;
use quote_harvest::ScrapeError;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration for the mock site with millisecond delays
fn create_test_config(base_url: &str, data_path: &Path) -> Config {
    Config {
        site: SiteConfig {
            base_url: format!("{}/", base_url),
            username: "admin".to_string(),
            password: "secret".to_string(),
            login_path: "login".to_string(),
            csrf_field: "csrf_token".to_string(),
            logged_in_marker: "Logout".to_string(),
            review_site_domain: "goodreads.com".to_string(),
        },
        http: HttpConfig {
            timeout_secs: 5,
            ..HttpConfig::default()
        },
        retry: RetryConfig {
            max_retries: 1,
            base_delay_ms: 1,
            max_delay_ms: 5,
            rate_limit_initial_ms: 1,
            rate_limit_max_ms: 5,
            page_delay_min_ms: 1,
            page_delay_max_ms: 5,
        },
        selectors: SelectorConfig::default(),
        output: OutputConfig {
            data_path: data_path.display().to_string(),
            report_path: data_path
                .with_file_name("qa_report.txt")
                .display()
                .to_string(),
            log_path: None,
        },
    }
}

fn quote_html(text: &str, author: &str, tags: &[&str]) -> String {
    let slug = author.replace(' ', "-");
    let tags: String = tags
        .iter()
        .map(|t| format!(r#"<a class="tag" href="/tag/{t}/page/1/">{t}</a>"#))
        .collect();

    format!(
        r#"<div class="quote">
            <span class="text">“{text}”</span>
            <span>by <small class="author">{author}</small>
                <a href="/author/{slug}">(about)</a></span>
            <div class="tags">Tags: {tags}</div>
        </div>"#
    )
}

fn listing_page(quotes: &[String], next: Option<&str>) -> String {
    let pager = match next {
        Some(href) => format!(r#"<ul class="pager"><li class="next"><a href="{href}">Next</a></li></ul>"#),
        None => String::new(),
    };

    format!(
        r#"<html><body>
            <div class="header"><a href="/logout">Logout</a></div>
            {}
            {pager}
        </body></html>"#,
        quotes.concat()
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Mounts the login form, the login POST and the author pages
async fn mount_login_and_authors(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(html(
            r#"<html><body><form method="post" action="/login">
                <input type="hidden" name="csrf_token" value="tok123">
                <input name="username"><input name="password" type="password">
            </form></body></html>"#
                .to_string(),
        ))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("csrf_token=tok123"))
        .and(body_string_contains("username=admin"))
        .respond_with(html(listing_page(&[], None)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/author/.+"))
        .respond_with(html(
            r#"<html><body>
                <a href="/">Quotes to Scrape</a>
                <a href="https://www.goodreads.com/author/show/9810">more at Goodreads</a>
            </body></html>"#
                .to_string(),
        ))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn read_pages(data_path: &Path) -> Vec<PageEntry> {
    let content = std::fs::read_to_string(data_path).expect("Failed to read data file");
    serde_json::from_str(&content).expect("Data file is not a page array")
}

#[tokio::test]
async fn test_full_crawl_three_pages() {
    let server = MockServer::start().await;
    mount_login_and_authors(&server).await;

    mount_page(
        &server,
        "/",
        listing_page(
            &[
                quote_html("First", "Albert Einstein", &["change", "thinking"]),
                quote_html("Second", "J.K. Rowling", &["abilities"]),
            ],
            Some("/page/2/"),
        ),
    )
    .await;
    mount_page(
        &server,
        "/page/2/",
        listing_page(
            &[
                quote_html("Third", "Jane Austen", &[]),
                // No quote text: dropped, the rest of the page is kept
                r#"<div class="quote">
                    <span>by <small class="author">Mark Twain</small>
                        <a href="/author/Mark-Twain">(about)</a></span>
                </div>"#
                    .to_string(),
            ],
            Some("/page/3/"),
        ),
    )
    .await;
    mount_page(
        &server,
        "/page/3/",
        listing_page(
            &[
                quote_html("Fourth", "Marilyn Monroe", &["love"]),
                quote_html("Fifth", "André Gide", &["life"]),
            ],
            None,
        ),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("outputs").join("data.json");
    let config = create_test_config(&server.uri(), &data_path);

    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.state, CrawlState::Done);
    assert_eq!(report.stop_reason, StopReason::LastPage);
    assert_eq!(report.pages_scraped, 3);
    assert_eq!(report.pages_failed, 0);
    assert_eq!(report.quotes_collected, 5);
    assert_eq!(report.visited.len(), 3);

    let pages = read_pages(&data_path);
    let counts: Vec<usize> = pages.iter().map(|p| p.quotes.len()).collect();
    let numbers: Vec<i64> = pages.iter().map(|p| p.page).collect();
    assert_eq!(counts, vec![2, 1, 2]);
    assert_eq!(numbers, vec![1, 2, 3]);

    let first = &pages[0].quotes[0];
    assert_eq!(first.text, "“First”");
    assert_eq!(first.author, "Albert Einstein");
    assert_eq!(
        first.author_url,
        format!("{}/author/Albert-Einstein", server.uri())
    );
    assert_eq!(first.tags.len(), 2);
    assert_eq!(
        first.tags[0].url,
        format!("{}/tag/change/page/1/", server.uri())
    );
    assert_eq!(first.goodreads_url, "https://www.goodreads.com/author/show/9810");
    assert_eq!(pages[1].quotes[0].author, "Jane Austen");
    assert!(pages[1].quotes[0].tags.is_empty());

    // Non-ASCII text is written as-is
    let raw = std::fs::read_to_string(&data_path).unwrap();
    assert!(raw.contains("André Gide"));

    let summary = generate_report(&data_path, &data_path.with_file_name("qa_report.txt"))
        .expect("QA report failed");
    assert_eq!(summary.total_records, 5);
    assert_eq!(summary.valid_records, 5);
    assert!(summary.duplicate_pages.is_empty());
}

#[tokio::test]
async fn test_rate_limit_does_not_consume_retries() {
    let server = MockServer::start().await;
    mount_login_and_authors(&server).await;

    mount_page(
        &server,
        "/",
        listing_page(&[quote_html("One", "Ann Lee", &[])], Some("/page/2/")),
    )
    .await;

    // Three 429s before the real page; more than max_retries allows
    Mock::given(method("GET"))
        .and(path("/page/2/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/page/2/",
        listing_page(&[quote_html("Two", "Bob Ray", &["x"])], None),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("data.json");
    let mut coordinator = Coordinator::new(create_test_config(&server.uri(), &data_path)).unwrap();

    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.state, CrawlState::Done);
    assert_eq!(report.pages_scraped, 2);
    assert_eq!(report.pages_failed, 0);

    let pages = read_pages(&data_path);
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1].page, 2);
    assert_eq!(pages[1].quotes[0].text, "“Two”");
}

#[tokio::test]
async fn test_rate_limited_page_is_fetched_once_for_quotes_and_next_link() {
    let server = MockServer::start().await;
    mount_login_and_authors(&server).await;

    let root = listing_page(&[quote_html("One", "Ann Lee", &[])], Some("/page/2/"));

    // Reachability check, then one 429, then the page itself; any further
    // fetch of the root is rate limited again
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(root.clone()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(root))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/page/2/",
        listing_page(&[quote_html("Two", "Bob Ray", &[])], None),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("data.json");
    let mut coordinator = Coordinator::new(create_test_config(&server.uri(), &data_path)).unwrap();

    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.state, CrawlState::Done);
    assert_eq!(report.stop_reason, StopReason::LastPage);
    assert_eq!(report.pages_scraped, 2);
    assert_eq!(report.pages_failed, 0);
    assert_eq!(read_pages(&data_path).len(), 2);
}

#[tokio::test]
async fn test_cycle_stops_without_revisiting() {
    let server = MockServer::start().await;
    mount_login_and_authors(&server).await;

    mount_page(
        &server,
        "/",
        listing_page(&[quote_html("Loop A", "Ann Lee", &[])], Some("/page/2/")),
    )
    .await;
    mount_page(
        &server,
        "/page/2/",
        listing_page(&[quote_html("Loop B", "Bob Ray", &[])], Some("/")),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("data.json");
    let mut coordinator = Coordinator::new(create_test_config(&server.uri(), &data_path)).unwrap();

    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.state, CrawlState::Done);
    assert_eq!(report.stop_reason, StopReason::LoopDetected);
    assert_eq!(report.pages_scraped, 2);
    assert_eq!(read_pages(&data_path).len(), 2);
}

#[tokio::test]
async fn test_cycle_stops_before_sleeping() {
    let server = MockServer::start().await;
    mount_login_and_authors(&server).await;

    mount_page(
        &server,
        "/",
        listing_page(&[quote_html("Loop A", "Ann Lee", &[])], Some("/page/2/")),
    )
    .await;
    mount_page(
        &server,
        "/page/2/",
        listing_page(&[quote_html("Loop B", "Bob Ray", &[])], Some("/")),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("data.json");
    let mut config = create_test_config(&server.uri(), &data_path);
    config.retry.page_delay_min_ms = 1_500;
    config.retry.page_delay_max_ms = 1_500;
    let mut coordinator = Coordinator::new(config).unwrap();

    let started = std::time::Instant::now();
    let report = coordinator.run().await.expect("Crawl failed");

    // One pause between the two pages, none before stopping on the loop
    assert_eq!(report.stop_reason, StopReason::LoopDetected);
    assert_eq!(report.visited.len(), 2);
    assert!(started.elapsed() < std::time::Duration::from_millis(2_800));
}

#[tokio::test]
async fn test_exhausted_retries_end_crawl_gracefully() {
    let server = MockServer::start().await;
    mount_login_and_authors(&server).await;

    mount_page(
        &server,
        "/",
        listing_page(&[quote_html("Only", "Ann Lee", &[])], Some("/page/2/")),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/page/2/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("data.json");
    let mut coordinator = Coordinator::new(create_test_config(&server.uri(), &data_path)).unwrap();

    let report = coordinator.run().await.expect("Page failures must not be fatal");

    assert_eq!(report.state, CrawlState::Done);
    assert_eq!(report.stop_reason, StopReason::NextPageUnavailable);
    assert_eq!(report.pages_scraped, 1);
    assert_eq!(report.pages_failed, 1);
    assert_eq!(read_pages(&data_path).len(), 1);

    // Reachability check, the first page, then the session check after the failure
    let root_fetches = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method == wiremock::http::Method::Get && r.url.path() == "/")
        .count();
    assert_eq!(root_fetches, 3);
}

#[tokio::test]
async fn test_missing_csrf_token_fails_login() {
    let server = MockServer::start().await;

    mount_page(&server, "/", listing_page(&[], None)).await;
    mount_page(
        &server,
        "/login",
        r#"<html><body><form method="post"><input name="username"></form></body></html>"#
            .to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("data.json");
    std::fs::write(&data_path, "previous output").unwrap();

    let mut coordinator = Coordinator::new(create_test_config(&server.uri(), &data_path)).unwrap();
    let err = coordinator.run().await.unwrap_err();

    assert!(matches!(err, ScrapeError::LoginFailed { .. }));
    assert_eq!(coordinator.state(), CrawlState::Failed);
    assert_eq!(std::fs::read_to_string(&data_path).unwrap(), "previous output");
}

#[tokio::test]
async fn test_unreachable_site_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("data.json");
    let mut coordinator = Coordinator::new(create_test_config(&server.uri(), &data_path)).unwrap();

    let err = coordinator.run().await.unwrap_err();

    assert!(matches!(err, ScrapeError::SiteUnreachable { .. }));
    assert_eq!(coordinator.state(), CrawlState::Failed);
    assert!(!data_path.exists());
}

#[tokio::test]
async fn test_next_page_url_respects_seen_set() {
    use quote_harvest::crawler::{QuotePageParser, Session};
    use std::collections::HashSet;

    let server = MockServer::start().await;
    mount_page(&server, "/page/2/", listing_page(&[], Some("/page/3/"))).await;
    mount_page(&server, "/page/3/", listing_page(&[], None)).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir.path().join("data.json"));
    let base = url::Url::parse(&config.site.base_url).unwrap();
    let session = Session::new(base, &config.http).unwrap();
    let parser = QuotePageParser::new(session, &config).unwrap();

    let page_2 = format!("{}/page/2/", server.uri());
    let page_3 = format!("{}/page/3/", server.uri());

    let mut seen = HashSet::new();
    seen.insert(page_2.clone());
    assert_eq!(
        parser.next_page_url(&page_2, &seen).await.unwrap(),
        Some(page_3.clone())
    );

    seen.insert(page_3.clone());
    assert_eq!(parser.next_page_url(&page_2, &seen).await.unwrap(), None);
    assert_eq!(parser.next_page_url(&page_3, &seen).await.unwrap(), None);

    assert!(parser.parse_quotes(&page_3).await.unwrap().is_empty());
    let page = parser.parse_page(&page_2).await.unwrap();
    assert!(page.quotes.is_empty());
    assert_eq!(page.next, Some(page_3));
}
