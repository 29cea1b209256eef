//! DOM access layer
//!
//! Wraps `scraper`'s error-recovering HTML5 tree builder. Malformed markup
//! (unclosed tags, bad nesting, no doctype) always yields a best-effort
//! tree; only empty or binary input is rejected.
//!
//! Both extraction pipelines read the tree exclusively through [`DomTree`]
//! and [`DomNode`], which expose node kind, tag name, attributes, children,
//! and a pre-order traversal.

mod node;
mod text;

pub use node::{DomNode, NodeKind};
pub use text::collapse_whitespace;

use crate::url::{is_web_url, resolve};
use crate::ExtractError;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Leading bytes inspected when deciding whether input is binary
const SNIFF_WINDOW: usize = 1024;

/// Share of control or undecodable characters above which input is binary
const BINARY_THRESHOLD: f64 = 0.10;

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("head title, title").expect("valid title selector"));

static BASE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("base[href]").expect("valid base selector"));

/// A parsed HTML document
pub struct DomTree {
    html: Html,
}

/// Parses raw response bytes into a [`DomTree`]
///
/// Convenience wrapper around [`DomTree::parse`].
pub fn parse(bytes: &[u8]) -> Result<DomTree, ExtractError> {
    DomTree::parse(bytes)
}

impl DomTree {
    /// Parses raw response bytes
    ///
    /// Bytes are decoded as UTF-8, replacing invalid sequences. Any
    /// non-empty textual input produces a tree.
    ///
    /// # Returns
    ///
    /// * `Ok(DomTree)` - Parsed document (possibly recovered from bad markup)
    /// * `Err(ExtractError::ParseFailure)` - Input was empty or binary
    ///
    /// # Example
    ///
    /// ```
    /// use nanoserp::dom::DomTree;
    ///
    /// let dom = DomTree::parse(b"<p>unclosed <b>tags").unwrap();
    /// assert_eq!(dom.root().text(), "unclosed tags");
    /// ```
    pub fn parse(bytes: &[u8]) -> Result<Self, ExtractError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ExtractError::ParseFailure(
                "document is empty".to_string(),
            ));
        }

        if looks_binary(bytes) {
            return Err(ExtractError::ParseFailure(
                "document is binary, not HTML".to_string(),
            ));
        }

        let decoded = String::from_utf8_lossy(bytes);
        let source = decoded.strip_prefix('\u{feff}').unwrap_or(&decoded);
        let html = Html::parse_document(source);

        tracing::trace!("Parsed document of {} bytes", bytes.len());

        Ok(Self { html })
    }

    /// Parses an HTML string
    pub fn from_html(html: &str) -> Result<Self, ExtractError> {
        Self::parse(html.as_bytes())
    }

    /// The document's root `<html>` element
    pub fn root(&self) -> DomNode<'_> {
        DomNode::Element(self.html.root_element())
    }

    /// Pre-order traversal of every node under the root element
    pub fn descendants(&self) -> impl Iterator<Item = DomNode<'_>> + '_ {
        self.root().descendants()
    }

    /// Elements matching a CSS selector, in document order
    pub fn select<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = DomNode<'a>> + 'a {
        self.html.select(selector).map(DomNode::Element)
    }

    /// First element matching a CSS selector
    pub fn select_first<'a>(&'a self, selector: &'a Selector) -> Option<DomNode<'a>> {
        self.select(selector).next()
    }

    /// The trimmed, whitespace-collapsed `<title>` text
    pub fn title(&self) -> Option<String> {
        self.select_first(&TITLE_SELECTOR)
            .map(|title| title.text())
            .filter(|text| !text.is_empty())
    }

    /// The raw `href` of the document's `<base>` element
    pub fn base_href(&self) -> Option<&str> {
        self.select_first(&BASE_SELECTOR)
            .and_then(|base| base.attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
    }

    /// The URL relative references in this document resolve against
    ///
    /// A `<base href>` overrides the response URL; an unusable one is ignored.
    pub fn base_url(&self, response_url: &Url) -> Url {
        self.base_href()
            .and_then(|href| resolve(response_url, href).ok())
            .filter(is_web_url)
            .unwrap_or_else(|| response_url.clone())
    }
}

impl std::fmt::Debug for DomTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomTree")
            .field("title", &self.title())
            .finish_non_exhaustive()
    }
}

/// Detects binary payloads (images, archives, PDFs) served where HTML was expected
fn looks_binary(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(SNIFF_WINDOW)];

    if window.contains(&0) {
        return true;
    }

    let decoded = String::from_utf8_lossy(window);
    let mut total = 0usize;
    let mut suspicious = 0usize;
    for ch in decoded.chars() {
        total += 1;
        let is_control = ch.is_control() && !matches!(ch, '\t' | '\n' | '\r' | '\x0c');
        if is_control || ch == char::REPLACEMENT_CHARACTER {
            suspicious += 1;
        }
    }

    total > 0 && (suspicious as f64 / total as f64) > BINARY_THRESHOLD
}
