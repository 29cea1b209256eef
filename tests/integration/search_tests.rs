//! Integration tests for the search pipeline
//!
//! These tests use wiremock to stand in for the search endpoint and run the
//! full fetch, classify and extract cycle.

use chrono::{Duration, TimeZone, Utc};
use nanoserp::{Config, ExtractError, NanoserpClient, NanoserpError, SearchRequest};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESULTS_PAGE: &str = include_str!("../fixtures/ddg_results.html");
const NO_RESULTS_PAGE: &str = include_str!("../fixtures/ddg_no_results.html");
const BROKEN_PAGE: &str = include_str!("../fixtures/ddg_broken.html");
const BLOCKED_PAGE: &str = include_str!("../fixtures/ddg_blocked.html");

const NEXT_TOKEN: &str = "4-211736589613432891377523614218362946";

/// Creates a client whose search endpoint is the mock server
fn create_test_client(server: &MockServer) -> NanoserpClient {
    let mut config = Config::default();
    config.http.search_endpoint = format!("{}/html/", server.uri());
    NanoserpClient::new(config).expect("Failed to build client")
}

fn html(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.as_bytes().to_vec(), "text/html; charset=UTF-8")
}

#[tokio::test]
async fn test_search_results_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/html/"))
        .and(body_string_contains("q=rust+programming"))
        .respond_with(html(200, RESULTS_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let before = Utc::now();
    let page = client
        .search(&SearchRequest::new("rust programming"))
        .await
        .expect("Search should succeed");

    assert_eq!(page.query, "rust programming");
    assert_eq!(page.results.len(), 10, "sponsored result must be skipped");

    let first = &page.results[0];
    assert_eq!(first.title, "Rust Programming Language");
    assert_eq!(first.url.as_str(), "https://www.rust-lang.org/");
    assert_eq!(
        first.snippet,
        "A language empowering everyone to build reliable and efficient software."
    );
    assert_eq!(first.published_at, None);

    // Markup inside the snippet is flattened
    assert_eq!(
        page.results[1].snippet,
        "Welcome to The Rust Programming Language, an introductory book about Rust."
    );

    // Redirect wrapper decoded, parentheses intact
    assert_eq!(
        page.results[2].url.as_str(),
        "https://en.wikipedia.org/wiki/Rust_(programming_language)"
    );

    // Leading relative date is split off the snippet
    let announced = &page.results[3];
    assert_eq!(
        announced.snippet,
        "The Rust team is happy to announce a new version of Rust, 1.80.0."
    );
    let published = announced.published_at.expect("relative date should parse");
    assert!(published <= before - Duration::days(3) + Duration::minutes(1));
    assert!(published >= before - Duration::days(3) - Duration::minutes(1));

    // Missing snippet becomes empty, record is kept
    assert_eq!(page.results[4].url.as_str(), "https://github.com/rust-lang/rust");
    assert_eq!(page.results[4].snippet, "");

    // Extras timestamp with a seven-digit fraction
    assert_eq!(
        page.results[5].published_at,
        Some(Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap())
    );

    assert_eq!(page.results[7].snippet, "The Rust community's crate registry.");
    assert_eq!(page.results[9].url.as_str(), "https://this-week-in-rust.org/");

    assert_eq!(page.pagination_token.as_deref(), Some(NEXT_TOKEN));
    assert_eq!(page.next_offset, Some(10));
    assert!(page.has_next_page());
}

#[tokio::test]
async fn test_search_sends_date_filter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/html/"))
        .and(body_string_contains("df=w"))
        .respond_with(html(200, RESULTS_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let request = SearchRequest::new("rust programming").with_date_filter("week".parse().ok());
    let page = client.search(&request).await.expect("Search should succeed");

    assert_eq!(page.results.len(), 10);
}

#[tokio::test]
async fn test_search_no_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/html/"))
        .respond_with(html(200, NO_RESULTS_PAGE))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let page = client
        .search(&SearchRequest::new("qwxzvbnmasdf"))
        .await
        .expect("An explicit 'no results' page is not an error");

    assert!(page.is_empty());
    assert_eq!(page.query, "qwxzvbnmasdf");
    assert!(!page.has_next_page());
}

#[tokio::test]
async fn test_search_unrecognised_layout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/html/"))
        .respond_with(html(200, BROKEN_PAGE))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client.search(&SearchRequest::new("rust programming")).await;

    assert!(matches!(
        result,
        Err(NanoserpError::Extract(ExtractError::ExtractionFailure(_)))
    ));
}

#[tokio::test]
async fn test_search_rate_limited_despite_results_markup() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/html/"))
        .respond_with(html(429, RESULTS_PAGE))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client
        .search(&SearchRequest::new("rust programming"))
        .await
        .expect_err("429 must not yield results");

    assert!(matches!(err, NanoserpError::Extract(ExtractError::RateLimited)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_search_block_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/html/"))
        .respond_with(html(200, BLOCKED_PAGE))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client
        .search(&SearchRequest::new("rust programming"))
        .await
        .expect_err("Challenge page must not yield results");

    assert!(matches!(
        err,
        NanoserpError::Extract(ExtractError::Blocked { .. })
    ));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_search_server_error_is_empty_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/html/"))
        .respond_with(html(500, "<html><body>Internal error</body></html>"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client.search(&SearchRequest::new("rust")).await;

    assert!(matches!(
        result,
        Err(NanoserpError::Extract(ExtractError::EmptyResponse { status: 500 }))
    ));
}

#[tokio::test]
async fn test_later_page_bootstraps_token() {
    let mock_server = MockServer::start().await;

    let second_page = r#"<html><head><title>rust programming at DuckDuckGo</title></head><body>
        <div class="result"><a class="result__a" href="https://docs.rs/">Docs.rs</a>
        <a class="result__snippet" href="https://docs.rs/">Documentation host for crates.</a></div>
        </body></html>"#;

    // Registered first so it wins for the request carrying the token
    Mock::given(method("POST"))
        .and(path("/html/"))
        .and(body_string_contains(format!("vqd={}", NEXT_TOKEN)))
        .and(body_string_contains("s=10"))
        .respond_with(html(200, second_page))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/html/"))
        .respond_with(html(200, RESULTS_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let request = SearchRequest::new("rust programming").with_offset(10);
    let page = client.search(&request).await.expect("Search should succeed");

    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].title, "Docs.rs");
    assert!(!page.has_next_page());
}

#[tokio::test]
async fn test_later_page_without_token_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/html/"))
        .respond_with(html(200, NO_RESULTS_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let request = SearchRequest::new("qwxzvbnmasdf").with_offset(10);
    let page = client.search(&request).await.expect("Search should succeed");

    assert!(page.is_empty());
    assert_eq!(page.query, "qwxzvbnmasdf");
}

#[tokio::test]
async fn test_supplied_token_skips_bootstrap() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/html/"))
        .and(body_string_contains("vqd=4-abc"))
        .and(body_string_contains("dc=21"))
        .respond_with(html(200, RESULTS_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let request = SearchRequest::new("rust programming")
        .with_offset(20)
        .with_token(Some("4-abc".to_string()));
    let page = client.search(&request).await.expect("Search should succeed");

    assert_eq!(page.results.len(), 10);
}
