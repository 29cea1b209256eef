use serde::Serialize;
use url::Url;

/// A page converted to markdown, with its outbound links
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedPage {
    /// The URL the caller asked for (before redirects)
    pub source_url: Url,
    pub markdown: String,
    /// Unique by URL, in first-seen order
    pub links: Vec<ScrapedLink>,
}

/// An outbound link found on a scraped page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ScrapedLink {
    /// Collapsed anchor text; empty for image-only anchors
    pub text: String,
    pub url: Url,
}
