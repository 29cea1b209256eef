//! Output rendering for the command-line interface
//!
//! This module handles:
//! - Plain-text listings of search results and scraped pages
//! - JSON serialization of the same records

mod text;

pub use text::{format_scraped_page, format_search_page};

use serde::Serialize;

/// Serializes any record as pretty-printed JSON
///
/// # Example
///
/// ```
/// use nanoserp::output::to_json;
/// use nanoserp::SearchResultPage;
///
/// let json = to_json(&SearchResultPage::empty("rust")).unwrap();
/// assert!(json.contains("\"query\": \"rust\""));
/// ```
pub fn to_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
