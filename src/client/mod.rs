//! HTTP collaborator and orchestration
//!
//! [`NanoserpClient`] fetches, classifies and extracts. Parsed documents
//! never outlive the synchronous extraction step, so the returned futures
//! stay `Send`.

mod fetcher;

pub use fetcher::{build_http_client, fetch_page, submit_form, FetchedResponse};

use crate::config::Config;
use crate::response::ResponseClassifier;
use crate::scrape::{scrape_page, ScrapedPage};
use crate::search::{SearchExtractor, SearchRequest, SearchResultPage};
use crate::url::{is_web_url, normalize_url};
use crate::{ConfigError, ExtractError, NanoserpError, UrlError};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Search and scrape client
///
/// # Example
///
/// ```no_run
/// use nanoserp::{Config, NanoserpClient, SearchRequest};
///
/// # async fn run() -> nanoserp::Result<()> {
/// let client = NanoserpClient::new(Config::default())?;
/// let page = client.search(&SearchRequest::new("rust async")).await?;
/// for result in &page.results {
///     println!("{} - {}", result.title, result.url);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NanoserpClient {
    http: Client,
    config: Config,
    endpoint: Url,
    classifier: ResponseClassifier,
    extractor: SearchExtractor,
    timeout: Option<Duration>,
}

impl NanoserpClient {
    /// Builds a client from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(NanoserpClient)` - Ready to use
    /// * `Err(NanoserpError)` - Invalid endpoint or markers, or the HTTP
    ///   client could not be built
    pub fn new(config: Config) -> Result<Self, NanoserpError> {
        let endpoint = Url::parse(&config.http.search_endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid search_endpoint '{}': {}",
                config.http.search_endpoint, e
            ))
        })?;

        Ok(Self {
            http: build_http_client(&config.http)?,
            classifier: ResponseClassifier::new(&config.markers)?,
            extractor: SearchExtractor::new(&config.markers)?,
            endpoint,
            config,
            timeout: None,
        })
    }

    /// Overrides the configured timeout for every request made by this client
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs a search and extracts the results page
    ///
    /// A request for a later page without a session token first fetches the
    /// first page to obtain one; if that page has no token, there are no
    /// further pages and an empty page is returned.
    ///
    /// # Errors
    ///
    /// * `NanoserpError::Extract` - Rate limited, blocked, empty or
    ///   unrecognised results page
    /// * `NanoserpError::Timeout` / `NanoserpError::Http` - Transport failure
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResultPage, NanoserpError> {
        let mut request = request.clone();

        if request.needs_token() {
            tracing::info!(
                "Requesting session token for '{}' before offset {}",
                request.query,
                request.offset
            );

            let first_page = SearchRequest::new(request.query.clone())
                .with_date_filter(request.date_filter);
            let bootstrap = self.post_search(&first_page).await?;

            match bootstrap.pagination_token {
                Some(token) => request.token = Some(token),
                None => {
                    tracing::info!("No further pages for '{}'", request.query);
                    return Ok(SearchResultPage::empty(request.query));
                }
            }
        }

        let page = self.post_search(&request).await?;
        tracing::info!(
            "Search '{}' (offset {}) returned {} results",
            request.query,
            request.offset,
            page.results.len()
        );
        Ok(page)
    }

    /// Fetches a page and converts it to markdown and links
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute http(s) URL
    pub async fn scrape(&self, url: &str) -> Result<ScrapedPage, NanoserpError> {
        let requested = normalize_url(url)?;
        if !is_web_url(&requested) {
            return Err(UrlError::Parse(format!(
                "unsupported scheme '{}' in {}",
                requested.scheme(),
                url
            ))
            .into());
        }

        let fetched = fetch_page(&self.http, &requested, self.timeout).await?;
        let classified = self
            .classifier
            .classify(fetched.status, fetched.body, fetched.final_url);
        let page = scrape_page(classified, &requested)?;

        tracing::info!(
            "Scraped {} ({} links)",
            page.source_url,
            page.links.len()
        );
        Ok(page)
    }

    async fn post_search(&self, request: &SearchRequest) -> Result<SearchResultPage, NanoserpError> {
        let fetched = submit_form(
            &self.http,
            &self.endpoint,
            &request.form_params(),
            self.timeout,
        )
        .await?;

        let classified = self
            .classifier
            .classify(fetched.status, fetched.body, fetched.final_url);
        let (body, base_url) = classified.into_body()?;
        let page = self.extract(&body, &base_url, &request.query)?;
        Ok(page)
    }

    /// Parses and extracts synchronously; the tree is dropped before returning
    fn extract(
        &self,
        body: &[u8],
        base_url: &Url,
        query: &str,
    ) -> Result<SearchResultPage, ExtractError> {
        let dom = crate::dom::parse(body)?;
        self.extractor.extract_with_base(&dom, base_url, query)
    }
}
