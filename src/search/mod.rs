//! Search result extraction
//!
//! Turns a DuckDuckGo results page into [`SearchResultRecord`]s in page
//! order, plus the session token needed for the next page. Where results
//! live in the markup is isolated in [`locator`]; dates are handled in
//! [`dates`].

pub mod dates;
mod extractor;
pub mod locator;
mod query;
mod types;

pub use extractor::{extract_results, extract_search_page, SearchExtractor};
pub use query::{DateFilter, SearchRequest};
pub use types::{SearchResultPage, SearchResultRecord};
