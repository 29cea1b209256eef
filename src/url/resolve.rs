use crate::url::normalize::normalize_parsed;
use crate::UrlError;
use url::Url;

/// Schemes that never lead to another document
const NON_NAVIGABLE_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:", "vbscript:"];

/// Resolves a reference found in a document against the document's base URL
///
/// Handles absolute references, protocol-relative references (`//host/path`
/// inherits the base scheme), root-relative references, and path-relative
/// references with `.`/`..` collapsing. The result is normalized with the
/// same rules as [`normalize_url`](crate::url::normalize_url).
///
/// Any string is accepted; only empty input or a reference that cannot form
/// a URL at all is an error. Non-navigable schemes such as `javascript:`
/// resolve fine and are filtered by callers with [`is_navigable_href`].
///
/// # Examples
///
/// ```
/// use nanoserp::url::resolve;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/blog/post").unwrap();
/// assert_eq!(resolve(&base, "/about").unwrap().as_str(), "https://example.com/about");
/// assert_eq!(resolve(&base, "../img.png").unwrap().as_str(), "https://example.com/img.png");
/// assert_eq!(resolve(&base, "//cdn.example.com/x").unwrap().as_str(), "https://cdn.example.com/x");
/// ```
pub fn resolve(base: &Url, reference: &str) -> Result<Url, UrlError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(UrlError::Empty);
    }

    let joined = base
        .join(reference)
        .map_err(|e| UrlError::Parse(format!("{}: {}", reference, e)))?;

    normalize_parsed(joined)
}

/// Checks whether an href points at another document
///
/// Returns false for empty hrefs, same-page fragments (`#`, `#top`), and the
/// `javascript:`, `mailto:`, `tel:`, `data:` and `vbscript:` schemes.
pub fn is_navigable_href(href: &str) -> bool {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return false;
    }

    let lowered = href.to_ascii_lowercase();
    !NON_NAVIGABLE_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
}

/// Extracts the destination of a redirect wrapper link
///
/// Search engines route outbound clicks through their own host with the real
/// target percent-encoded in a query parameter, e.g.
/// `https://duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2F&rut=…`.
/// Returns `None` when `url` is not such a wrapper.
///
/// # Arguments
///
/// * `url` - The resolved link
/// * `host_suffix` - Host (or parent domain) of the redirect service
/// * `param` - Query parameter carrying the destination
pub fn unwrap_redirect(url: &Url, host_suffix: &str, param: &str) -> Option<Url> {
    let host = url.host_str()?;
    let on_redirect_host = host == host_suffix || host.ends_with(&format!(".{}", host_suffix));
    if !on_redirect_host {
        return None;
    }

    let target = url
        .query_pairs()
        .find(|(key, _)| key == param)
        .map(|(_, value)| value.into_owned())?;

    match Url::parse(target.trim()) {
        Ok(parsed) => normalize_parsed(parsed).ok(),
        Err(e) => {
            tracing::debug!("Ignoring undecodable redirect target '{}': {}", target, e);
            None
        }
    }
}
