use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

/// One organic result row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResultRecord {
    /// Collapsed anchor text; never empty
    pub title: String,
    /// Absolute destination, with redirect wrappers removed
    pub url: Url,
    /// Collapsed description text, with any leading date removed; may be empty
    pub snippet: String,
    /// Publication time shown next to the result, when there is one
    pub published_at: Option<DateTime<Utc>>,
}

/// Everything extracted from one results page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResultPage {
    pub query: String,
    /// Results in top-to-bottom page order
    pub results: Vec<SearchResultRecord>,
    /// Session token needed to request the next page
    pub pagination_token: Option<String>,
    /// Offset the next page starts at
    pub next_offset: Option<u32>,
}

impl SearchResultPage {
    /// A page with no results and no way forward
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            results: Vec::new(),
            pagination_token: None,
            next_offset: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn has_next_page(&self) -> bool {
        self.pagination_token.is_some()
    }
}
