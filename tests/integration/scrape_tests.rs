//! Integration tests for the scrape pipeline

use nanoserp::{Config, ExtractError, NanoserpClient, NanoserpError};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTICLE_PAGE: &str = include_str!("../fixtures/article.html");

fn html(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.as_bytes().to_vec(), "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_scrape_article() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/blog/post"))
        .respond_with(html(200, ARTICLE_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NanoserpClient::new(Config::default()).expect("Failed to build client");
    let page = client
        .scrape(&format!("{}/blog/post", base_url))
        .await
        .expect("Scrape should succeed");

    assert_eq!(page.source_url.as_str(), format!("{}/blog/post", base_url));

    assert!(page.markdown.contains("# Understanding Ownership"));
    assert!(page.markdown.contains("## Rules"));
    assert!(page.markdown.contains("- Each value has an owner."));
    assert!(page.markdown.contains("*unique*"));
    assert!(page.markdown.contains(
        "[official chapter](https://doc.rust-lang.org/book/ch04-00-understanding-ownership.html)"
    ));
    assert!(page
        .markdown
        .contains("```rust\nlet s = String::from(\"hello\");\nlet t = s;\n```"));
    assert!(!page.markdown.contains("analytics"));
    assert!(!page.markdown.contains("font-family"));

    let links: Vec<(&str, String)> = page
        .links
        .iter()
        .map(|link| (link.text.as_str(), link.url.to_string()))
        .collect();
    assert_eq!(
        links,
        vec![
            ("Home", format!("{}/", base_url)),
            ("About", format!("{}/about", base_url)),
            (
                "official chapter",
                "https://doc.rust-lang.org/book/ch04-00-understanding-ownership.html".to_string()
            ),
            ("Related posts", format!("{}/blog/related", base_url)),
        ]
    );
}

#[tokio::test]
async fn test_scrape_follows_redirects() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/blog/post"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/blog/post"))
        .respond_with(html(200, ARTICLE_PAGE))
        .mount(&mock_server)
        .await;

    let client = NanoserpClient::new(Config::default()).expect("Failed to build client");
    let page = client
        .scrape(&format!("{}/old", base_url))
        .await
        .expect("Scrape should succeed");

    // Reported under the requested URL, resolved against the final one
    assert_eq!(page.source_url.as_str(), format!("{}/old", base_url));
    assert!(page
        .links
        .iter()
        .any(|link| link.url.as_str() == format!("{}/blog/related", base_url)));
}

#[tokio::test]
async fn test_scrape_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(html(404, "<html><body><h1>Not Found</h1></body></html>"))
        .mount(&mock_server)
        .await;

    let client = NanoserpClient::new(Config::default()).expect("Failed to build client");
    let result = client
        .scrape(&format!("{}/missing", mock_server.uri()))
        .await;

    assert!(matches!(
        result,
        Err(NanoserpError::Extract(ExtractError::EmptyResponse { status: 404 }))
    ));
}

#[tokio::test]
async fn test_scrape_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html(429, ARTICLE_PAGE))
        .mount(&mock_server)
        .await;

    let client = NanoserpClient::new(Config::default()).expect("Failed to build client");
    let result = client.scrape(&mock_server.uri()).await;

    assert!(matches!(
        result,
        Err(NanoserpError::Extract(ExtractError::RateLimited))
    ));
}

#[tokio::test]
async fn test_scrape_binary_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0x0d], "image/png"),
        )
        .mount(&mock_server)
        .await;

    let client = NanoserpClient::new(Config::default()).expect("Failed to build client");
    let result = client
        .scrape(&format!("{}/logo.png", mock_server.uri()))
        .await;

    assert!(matches!(
        result,
        Err(NanoserpError::Extract(ExtractError::ParseFailure(_)))
    ));
}

#[tokio::test]
async fn test_scrape_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html(200, ARTICLE_PAGE).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let client = NanoserpClient::new(Config::default())
        .expect("Failed to build client")
        .with_timeout(Duration::from_millis(200));
    let err = client
        .scrape(&format!("{}/slow", mock_server.uri()))
        .await
        .expect_err("Slow response must time out");

    assert!(matches!(err, NanoserpError::Timeout { .. }));
    assert!(err.is_retryable());
}
