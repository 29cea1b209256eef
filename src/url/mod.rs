//! URL handling module for nanoserp
//!
//! This module resolves references found in documents against their base URL
//! and normalizes the result, so every link that leaves an extractor is
//! absolute and comparable.

mod normalize;
mod resolve;

// Re-export main functions
pub use normalize::normalize_url;
pub use resolve::{is_navigable_href, resolve, unwrap_redirect};

use ::url::Url;

/// Returns true if the URL uses http or https
///
/// Extractors only hand out web URLs; anything else resolved from a
/// document (`ftp:`, `about:`, custom app schemes) is dropped.
pub fn is_web_url(url: &Url) -> bool {
    normalize::is_web_scheme(url.scheme())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_web_url() {
        assert!(is_web_url(&Url::parse("https://example.com/").unwrap()));
        assert!(is_web_url(&Url::parse("http://example.com/").unwrap()));
        assert!(!is_web_url(&Url::parse("ftp://example.com/").unwrap()));
        assert!(!is_web_url(&Url::parse("mailto:a@example.com").unwrap()));
    }
}
