//! Page scraping
//!
//! Converts an arbitrary page into markdown and collects its outbound
//! links. Both walks run over the same parsed tree and resolve relative
//! references against the same base URL.

mod links;
mod markdown;
mod types;
mod writer;

pub use links::collect_links;
pub use markdown::to_markdown;
pub use types::{ScrapedLink, ScrapedPage};

use crate::dom::DomTree;
use crate::response::ClassifiedResponse;
use crate::ExtractError;
use url::Url;

/// Parses a classified response into markdown and links
///
/// Relative references resolve against the response's final URL, or the
/// document's `<base href>` when it has one. The returned page's
/// `source_url` is `requested_url`.
///
/// # Returns
///
/// * `Ok(ScrapedPage)` - Converted page
/// * `Err(ExtractError)` - The response was not `Ok`, or the body is not HTML
pub fn scrape_page(
    response: ClassifiedResponse,
    requested_url: &Url,
) -> Result<ScrapedPage, ExtractError> {
    let (body, final_url) = response.into_body()?;
    let dom = DomTree::parse(&body)?;
    let base_url = dom.base_url(&final_url);

    if final_url != *requested_url {
        tracing::debug!("{} was served from {}", requested_url, final_url);
    }

    let markdown = to_markdown(&dom, &base_url);
    let links = collect_links(&dom, &base_url);

    tracing::debug!(
        "Scraped {}: {} bytes of markdown, {} links",
        requested_url,
        markdown.len(),
        links.len()
    );

    Ok(ScrapedPage {
        source_url: requested_url.clone(),
        markdown,
        links,
    })
}
