//! nanoserp: search results and page scraping from raw HTML
//!
//! This crate turns fetched HTML into structured data. It parses DuckDuckGo
//! result pages into ordered result records and converts arbitrary pages into
//! markdown plus a deduplicated list of outbound links. Both pipelines run on
//! untrusted markup that may be malformed, truncated, or a block page posing
//! as a normal response.

pub mod client;
pub mod config;
pub mod dom;
pub mod output;
pub mod response;
pub mod scrape;
pub mod search;
pub mod url;

use thiserror::Error;

/// Main error type for nanoserp operations
#[derive(Debug, Error)]
pub enum NanoserpError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Extract(#[from] ExtractError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timed out for {url}")]
    Timeout { url: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NanoserpError {
    /// Returns true if the caller should back off and retry later
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Extract(e) => e.is_retryable(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

/// Outcomes of classifying and extracting a fetched page that are not data
///
/// The variants never overlap: a response is rate limited, blocked, empty,
/// unparseable, or parsed but missing the structure the extractor expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Rate limit exceeded by upstream; back off before retrying")]
    RateLimited,

    #[error("Request blocked by upstream: {reason}")]
    Blocked { reason: String },

    #[error("No usable response body (HTTP {status})")]
    EmptyResponse { status: u16 },

    #[error("Failed to parse document: {0}")]
    ParseFailure(String),

    #[error("Expected page structure not found: {0}")]
    ExtractionFailure(String),
}

impl ExtractError {
    /// Only throttling is worth retrying; everything else is terminal for the request
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector in config: {0}")]
    InvalidSelector(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Empty URL reference")]
    Empty,

    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for nanoserp operations
pub type Result<T> = std::result::Result<T, NanoserpError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for classification and extraction
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

// Re-export commonly used types
pub use client::NanoserpClient;
pub use config::Config;
pub use dom::{DomNode, DomTree};
pub use response::{classify, ClassifiedResponse, ResponseClassifier};
pub use scrape::{collect_links, scrape_page, to_markdown, ScrapedLink, ScrapedPage};
pub use search::{
    extract_results, extract_search_page, DateFilter, SearchExtractor, SearchRequest,
    SearchResultPage, SearchResultRecord,
};
pub use crate::url::{normalize_url, resolve};
