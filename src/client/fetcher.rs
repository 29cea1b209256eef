//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests, including:
//! - Building HTTP clients with a browser user agent
//! - GET requests for pages and form POSTs for searches
//! - Redirect following
//! - Mapping transport failures to [`NanoserpError`]

use crate::config::HttpConfig;
use crate::NanoserpError;
use reqwest::{redirect::Policy, Client, RequestBuilder};
use std::time::Duration;
use url::Url;

/// Upper bound on connection setup, independent of the request timeout
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A response as the classifier sees it
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// HTTP status code of the final response
    pub status: u16,
    /// Raw body bytes (decompressed)
    pub body: Vec<u8>,
    /// Final URL after redirects
    pub final_url: Url,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use nanoserp::client::build_http_client;
/// use nanoserp::config::HttpConfig;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page with GET, following redirects
pub async fn fetch_page(
    client: &Client,
    url: &Url,
    timeout: Option<Duration>,
) -> Result<FetchedResponse, NanoserpError> {
    tracing::debug!("GET {}", url);
    send(client.get(url.clone()), url, timeout).await
}

/// POSTs a urlencoded form
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `endpoint` - Form action URL
/// * `params` - Form fields, in order
/// * `timeout` - Overrides the client's timeout for this request
pub async fn submit_form(
    client: &Client,
    endpoint: &Url,
    params: &[(&'static str, String)],
    timeout: Option<Duration>,
) -> Result<FetchedResponse, NanoserpError> {
    tracing::debug!("POST {} ({} fields)", endpoint, params.len());
    send(client.post(endpoint.clone()).form(params), endpoint, timeout).await
}

async fn send(
    request: RequestBuilder,
    url: &Url,
    timeout: Option<Duration>,
) -> Result<FetchedResponse, NanoserpError> {
    let request = match timeout {
        Some(timeout) => request.timeout(timeout),
        None => request,
    };

    let response = request.send().await.map_err(|e| transport_error(url, e))?;
    let status = response.status().as_u16();
    let final_url = response.url().clone();

    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(url, e))?
        .to_vec();

    tracing::debug!(
        "HTTP {} from {} ({} bytes)",
        status,
        final_url,
        body.len()
    );

    Ok(FetchedResponse {
        status,
        body,
        final_url,
    })
}

/// Classifies a reqwest failure
fn transport_error(url: &Url, error: reqwest::Error) -> NanoserpError {
    if error.is_timeout() {
        tracing::warn!("Request to {} timed out", url);
        NanoserpError::Timeout {
            url: url.to_string(),
        }
    } else {
        if error.is_connect() {
            tracing::warn!("Connection to {} failed", url);
        }
        NanoserpError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
