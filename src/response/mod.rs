//! Response classification
//!
//! Every fetched response passes through [`ResponseClassifier`] before any
//! extraction. Throttling, block pages and empty responses are recognised
//! here so the extractors only ever see bodies worth parsing.

use crate::config::{compile_selectors, MarkerConfig};
use crate::dom::DomTree;
use crate::{ConfigError, ExtractError};
use scraper::Selector;
use serde::Serialize;
use std::sync::LazyLock;
use url::Url;

static DEFAULT_CLASSIFIER: LazyLock<ResponseClassifier> = LazyLock::new(ResponseClassifier::default);

/// Outcome of classifying a fetched response
///
/// Exactly one variant applies to any `(status, body, final_url)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifiedResponse {
    /// A body worth extracting, with the URL relative links resolve against
    Ok {
        #[serde(skip)]
        body: Vec<u8>,
        base_url: Url,
    },
    /// Upstream is throttling this client
    RateLimited,
    /// A challenge or block page served instead of content
    Blocked { reason: String },
    /// An error status or a body with nothing in it
    Empty { status: u16 },
}

impl ClassifiedResponse {
    /// Converts the classification into the extraction input or its error
    pub fn into_body(self) -> Result<(Vec<u8>, Url), ExtractError> {
        match self {
            Self::Ok { body, base_url } => Ok((body, base_url)),
            Self::RateLimited => Err(ExtractError::RateLimited),
            Self::Blocked { reason } => Err(ExtractError::Blocked { reason }),
            Self::Empty { status } => Err(ExtractError::EmptyResponse { status }),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

/// Classifies raw responses using the configured block markers
#[derive(Debug, Clone)]
pub struct ResponseClassifier {
    /// Lowercased block phrases
    block_phrases: Vec<String>,
    /// Compiled structural fingerprints of block pages
    block_selectors: Vec<Selector>,
}

impl ResponseClassifier {
    /// Builds a classifier from the `[markers]` configuration
    ///
    /// # Returns
    ///
    /// * `Ok(ResponseClassifier)` - Markers compiled
    /// * `Err(ConfigError::InvalidSelector)` - A block selector does not parse
    pub fn new(markers: &MarkerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            block_phrases: markers
                .block_phrases
                .iter()
                .map(|phrase| phrase.to_lowercase())
                .collect(),
            block_selectors: compile_selectors(&markers.block_selectors)?,
        })
    }

    /// Classifies a response
    ///
    /// Rules apply in priority order:
    ///
    /// 1. 429 is `RateLimited`, whatever the body says
    /// 2. 403 or 503 with a block marker anywhere, or a 2xx whose title
    ///    starts with a block phrase or whose structure matches a block
    ///    fingerprint, is `Blocked`
    /// 3. Any other status >= 400, or an empty body, is `Empty`
    /// 4. Everything else is `Ok`, with `final_url` as the base URL
    ///
    /// # Arguments
    ///
    /// * `status` - HTTP status code of the final response
    /// * `body` - Raw response body
    /// * `final_url` - URL after redirects
    pub fn classify(&self, status: u16, body: Vec<u8>, final_url: Url) -> ClassifiedResponse {
        if status == 429 {
            tracing::warn!("Rate limited by {}", host_of(&final_url));
            return ClassifiedResponse::RateLimited;
        }

        let has_content = !body.iter().all(u8::is_ascii_whitespace);
        let hard_block_status = status == 403 || status == 503;
        let success = (200..300).contains(&status);

        if has_content && (hard_block_status || success) {
            if let Ok(dom) = DomTree::parse(&body) {
                if let Some(reason) = self.block_reason(&dom, hard_block_status) {
                    tracing::warn!(
                        "Block page from {} (HTTP {}): {}",
                        host_of(&final_url),
                        status,
                        reason
                    );
                    return ClassifiedResponse::Blocked { reason };
                }
            }
        }

        if status >= 400 || !has_content {
            tracing::debug!("Empty response from {} (HTTP {})", final_url, status);
            return ClassifiedResponse::Empty { status };
        }

        ClassifiedResponse::Ok {
            body,
            base_url: final_url,
        }
    }

    /// Returns a description of the first block marker found in the page
    ///
    /// On error statuses a phrase anywhere in the title or page text counts.
    /// On success statuses only a title that starts with a phrase does, so a
    /// normal page about "access denied" errors is not a block.
    fn block_reason(&self, dom: &DomTree, hard_block_status: bool) -> Option<String> {
        if let Some(title) = dom.title() {
            let lowered = title.trim().to_lowercase();
            let phrase = if hard_block_status {
                self.contained_phrase(&lowered)
            } else {
                self.leading_phrase(&lowered)
            };
            if let Some(phrase) = phrase {
                return Some(format!("title matched '{}'", phrase));
            }
        }

        for selector in &self.block_selectors {
            if dom.select_first(selector).is_some() {
                return Some("page matched a challenge fingerprint".to_string());
            }
        }

        if hard_block_status {
            let lowered = dom.root().text().to_lowercase();
            if let Some(phrase) = self.contained_phrase(&lowered) {
                return Some(format!("page text matched '{}'", phrase));
            }
        }

        None
    }

    fn contained_phrase(&self, lowered: &str) -> Option<&str> {
        self.block_phrases
            .iter()
            .find(|phrase| lowered.contains(phrase.as_str()))
            .map(String::as_str)
    }

    fn leading_phrase(&self, lowered: &str) -> Option<&str> {
        self.block_phrases
            .iter()
            .find(|phrase| lowered.starts_with(phrase.as_str()))
            .map(String::as_str)
    }
}

impl Default for ResponseClassifier {
    fn default() -> Self {
        Self::new(&MarkerConfig::default()).expect("default block markers are valid")
    }
}

/// Classifies a response with the default block markers
///
/// See [`ResponseClassifier::classify`] for the rules.
pub fn classify(status: u16, body: Vec<u8>, final_url: Url) -> ClassifiedResponse {
    DEFAULT_CLASSIFIER.classify(status, body, final_url)
}

fn host_of(url: &Url) -> &str {
    url.host_str().unwrap_or("unknown host")
}
