use crate::UrlError;
use url::Url;

/// Normalizes an absolute URL string
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Lowercase the scheme and host, drop default ports, and remove dot
///    segments (all done by the parser for web schemes)
/// 3. Reject web URLs without a host
/// 4. Remove the fragment unless it is a client-side route (`#/…`, `#!…`)
/// 5. Remove an empty query string (trailing ?)
///
/// Non-web schemes such as `mailto:` are parsed and returned untouched.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use nanoserp::url::normalize_url;
///
/// let url = normalize_url("HTTPS://Example.COM:443/a/../page?q=1#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page?q=1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url_str = url_str.trim();
    if url_str.is_empty() {
        return Err(UrlError::Empty);
    }

    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Applies the normalization rules to an already parsed URL
pub(crate) fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if !is_web_scheme(url.scheme()) {
        return Ok(url);
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    if let Some(fragment) = url.fragment() {
        if !is_route_fragment(fragment) {
            url.set_fragment(None);
        }
    }

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Returns true for http and https
pub(crate) fn is_web_scheme(scheme: &str) -> bool {
    scheme == "http" || scheme == "https"
}

/// Hash routes address distinct views of a single-page app, so they are kept
fn is_route_fragment(fragment: &str) -> bool {
    fragment.starts_with('/') || fragment.starts_with('!')
}
