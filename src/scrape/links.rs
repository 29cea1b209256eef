//! Outbound link collection
//!
//! Walks every anchor in the document, independent of the markdown
//! conversion, so links the converter drops (hidden navigation, anchors
//! inside skipped containers) are still reported.

use crate::dom::{DomNode, DomTree};
use crate::scrape::types::ScrapedLink;
use crate::url::{is_navigable_href, is_web_url, resolve};
use std::collections::HashSet;
use url::Url;

/// Collects the document's outbound links
///
/// # Link Rules
///
/// **Include:**
/// - Every `<a href="...">`, in document order
///
/// **Exclude:**
/// - Empty hrefs and same-page fragments (`#`, `#top`)
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Anything that does not resolve to an http(s) URL
///
/// Links are deduplicated by resolved URL; the first occurrence's text wins.
///
/// # Arguments
///
/// * `dom` - The parsed page
/// * `base_url` - The base URL for resolving relative links
///
/// # Example
///
/// ```
/// use nanoserp::dom::DomTree;
/// use nanoserp::scrape::collect_links;
/// use url::Url;
///
/// let dom = DomTree::from_html(r#"<a href="/about">About us</a><a href="/about">again</a>"#).unwrap();
/// let base = Url::parse("https://example.com/blog/post").unwrap();
/// let links = collect_links(&dom, &base);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].url.as_str(), "https://example.com/about");
/// assert_eq!(links[0].text, "About us");
/// ```
pub fn collect_links(dom: &DomTree, base_url: &Url) -> Vec<ScrapedLink> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in dom.descendants().filter(is_link_anchor) {
        let Some(url) = anchor.attr("href").and_then(|href| resolve_link(href, base_url)) else {
            continue;
        };

        if !seen.insert(url.clone()) {
            continue;
        }

        links.push(ScrapedLink {
            text: anchor.text(),
            url,
        });
    }

    tracing::debug!("Collected {} unique links", links.len());
    links
}

/// Anchor elements carrying an href
fn is_link_anchor(node: &DomNode<'_>) -> bool {
    node.is_tag("a") && node.attr("href").is_some()
}

/// Resolves a link href to an absolute web URL
///
/// Returns `None` if the link should be excluded.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    if !is_navigable_href(href) {
        return None;
    }

    match resolve(base_url, href) {
        Ok(url) if is_web_url(&url) => Some(url),
        Ok(url) => {
            tracing::trace!("Skipping non-web link {}", url);
            None
        }
        Err(e) => {
            tracing::debug!("Skipping unresolvable link '{}': {}", href, e);
            None
        }
    }
}
