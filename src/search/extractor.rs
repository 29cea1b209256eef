use crate::config::{compile_selectors, MarkerConfig};
use crate::dom::{DomNode, DomTree};
use crate::response::ClassifiedResponse;
use crate::search::dates::{parse_timestamp, split_leading_date};
use crate::search::locator::{locate_containers, locate_next_page, LocatorStrategy};
use crate::search::types::{SearchResultPage, SearchResultRecord};
use crate::url::{is_navigable_href, is_web_url, resolve, unwrap_redirect};
use crate::{ConfigError, ExtractError};
use chrono::{DateTime, Utc};
use scraper::Selector;
use std::sync::LazyLock;
use url::Url;

/// Host of the search engine's own redirect and tracking links
const ENGINE_HOST: &str = "duckduckgo.com";

/// Query parameter carrying the destination of a redirect link
const REDIRECT_PARAM: &str = "uddg";

/// Path of sponsored-result click trackers
const AD_CLICK_PATH: &str = "/y.js";

static DEFAULT_BASE: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://html.duckduckgo.com/html/").expect("valid default base URL")
});

/// Extracts result records from a parsed results page
#[derive(Debug, Clone)]
pub struct SearchExtractor {
    no_results_selectors: Vec<Selector>,
    /// Lowercased
    no_results_phrases: Vec<String>,
    reference_time: Option<DateTime<Utc>>,
}

impl SearchExtractor {
    /// Builds an extractor using the configured "no results" markers
    pub fn new(markers: &MarkerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            no_results_selectors: compile_selectors(&markers.no_results_selectors)?,
            no_results_phrases: markers
                .no_results_phrases
                .iter()
                .map(|phrase| phrase.to_lowercase())
                .collect(),
            reference_time: None,
        })
    }

    /// Fixes "now" for relative dates such as `3 days ago`
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    /// Extracts every organic result, in page order, against the default base
    pub fn extract(&self, dom: &DomTree) -> Result<SearchResultPage, ExtractError> {
        self.extract_with_base(dom, &DEFAULT_BASE, "")
    }

    /// Extracts every organic result, in page order
    ///
    /// # Arguments
    ///
    /// * `dom` - Parsed results page
    /// * `base_url` - URL the page was served from, for relative links
    /// * `query` - Query echoed into the returned page
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResultPage)` - Results, possibly none if the page says so
    /// * `Err(ExtractError::ExtractionFailure)` - No usable result containers
    ///   and no "no results" marker, i.e. the layout is not recognised
    pub fn extract_with_base(
        &self,
        dom: &DomTree,
        base_url: &Url,
        query: &str,
    ) -> Result<SearchResultPage, ExtractError> {
        let base_url = dom.base_url(base_url);
        let next = locate_next_page(dom);

        let Some((strategy, containers)) = locate_containers(dom) else {
            if self.has_no_results_marker(dom) {
                tracing::info!("Upstream reported no results for '{}'", query);
                return Ok(SearchResultPage {
                    query: query.to_string(),
                    results: Vec::new(),
                    pagination_token: next.token,
                    next_offset: next.offset,
                });
            }

            return Err(ExtractError::ExtractionFailure(
                "no result containers and no \"no results\" marker".to_string(),
            ));
        };

        let now = self.reference_time.unwrap_or_else(Utc::now);
        let mut results = Vec::with_capacity(containers.len());
        let mut skipped = 0;

        for (index, container) in containers.iter().enumerate() {
            if strategy.is_ad(container) {
                tracing::debug!("Skipping sponsored container #{}", index);
                continue;
            }

            match extract_record(strategy, container, &base_url, now) {
                Some(record) => results.push(record),
                None => {
                    skipped += 1;
                    tracing::warn!(
                        "Skipping container #{} without a usable title and URL",
                        index
                    );
                }
            }
        }

        // Containers matched but none yielded a record: the field selectors drifted
        if results.is_empty() && skipped > 0 && !self.has_no_results_marker(dom) {
            return Err(ExtractError::ExtractionFailure(format!(
                "{} result containers matched strategy '{}' but none had a usable title and URL",
                skipped, strategy.name
            )));
        }

        tracing::debug!(
            "Extracted {} of {} containers with strategy '{}'",
            results.len(),
            containers.len(),
            strategy.name
        );

        Ok(SearchResultPage {
            query: query.to_string(),
            results,
            pagination_token: next.token,
            next_offset: next.offset,
        })
    }

    fn has_no_results_marker(&self, dom: &DomTree) -> bool {
        if self
            .no_results_selectors
            .iter()
            .any(|selector| dom.select_first(selector).is_some())
        {
            return true;
        }

        if self.no_results_phrases.is_empty() {
            return false;
        }

        let text = dom.root().text().to_lowercase();
        self.no_results_phrases
            .iter()
            .any(|phrase| text.contains(phrase.as_str()))
    }
}

impl Default for SearchExtractor {
    fn default() -> Self {
        Self::new(&MarkerConfig::default()).expect("default no-results markers are valid")
    }
}

/// Extracts results with the default markers
pub fn extract_results(dom: &DomTree) -> Result<SearchResultPage, ExtractError> {
    SearchExtractor::default().extract(dom)
}

/// Classifies, parses and extracts a fetched results page
///
/// Non-`Ok` classifications become their matching [`ExtractError`]. The
/// returned page's `query` is empty; callers that know it fill it in.
pub fn extract_search_page(response: ClassifiedResponse) -> Result<SearchResultPage, ExtractError> {
    let (body, base_url) = response.into_body()?;
    let dom = DomTree::parse(&body)?;
    SearchExtractor::default().extract_with_base(&dom, &base_url, "")
}

/// Builds one record from a result container
///
/// Returns `None` when no absolute URL can be found or there is no text to
/// use as a title.
fn extract_record(
    strategy: &LocatorStrategy,
    container: &DomNode<'_>,
    base_url: &Url,
    now: DateTime<Utc>,
) -> Option<SearchResultRecord> {
    let title_link = container.select_first(&strategy.title);
    let display_link = container.select_first(&strategy.display_url);

    let url = title_link
        .and_then(|link| link_target(&link, base_url))
        .or_else(|| display_link.and_then(|link| link_target(&link, base_url)))?;

    if is_ad_click(&url) {
        tracing::debug!("Skipping sponsored link {}", url);
        return None;
    }

    let title = title_link
        .map(|link| link.text())
        .filter(|text| !text.is_empty())
        .or_else(|| display_link.map(|link| link.text()).filter(|text| !text.is_empty()))?;

    let raw_snippet = container
        .select_first(&strategy.snippet)
        .map(|snippet| snippet.text())
        .unwrap_or_default();

    let (leading_date, snippet) = split_leading_date(&raw_snippet, now);
    let published_at = leading_date.or_else(|| container_timestamp(strategy, container));

    Some(SearchResultRecord {
        title,
        url,
        snippet,
        published_at,
    })
}

/// Resolves a result link to its final absolute web URL
fn link_target(link: &DomNode<'_>, base_url: &Url) -> Option<Url> {
    let href = link.attr("href")?;
    if !is_navigable_href(href) {
        return None;
    }

    let resolved = match resolve(base_url, href) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Unresolvable result href '{}': {}", href, e);
            return None;
        }
    };

    let target = unwrap_redirect(&resolved, ENGINE_HOST, REDIRECT_PARAM).unwrap_or(resolved);
    is_web_url(&target).then_some(target)
}

fn is_ad_click(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| host == ENGINE_HOST || host.ends_with(".duckduckgo.com"))
        && url.path() == AD_CLICK_PATH
}

/// First parseable timestamp among the container's timestamp elements
fn container_timestamp(strategy: &LocatorStrategy, container: &DomNode<'_>) -> Option<DateTime<Utc>> {
    let selector = strategy.timestamp.as_ref()?;
    container
        .select(selector)
        .find_map(|element| parse_timestamp(&element.text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn result_row(title: &str, href: &str, snippet: Option<&str>, timestamp: Option<&str>) -> String {
        let snippet = snippet
            .map(|s| format!(r#"<a class="result__snippet" href="{}">{}</a>"#, href, s))
            .unwrap_or_default();
        let timestamp = timestamp
            .map(|t| format!("<span>&nbsp;&nbsp;{}</span>", t))
            .unwrap_or_default();
        format!(
            r#"<div class="result results_links web-result"><div class="links_main result__body">
                 <h2 class="result__title"><a rel="nofollow" class="result__a" href="{href}">{title}</a></h2>
                 <div class="result__extras"><div class="result__extras__url">
                   <span class="result__icon"><a href="{href}"><img src="//external-content.duckduckgo.com/ip3/x.ico"></a></span>
                   <a class="result__url" href="{href}">display.example</a>{timestamp}
                 </div></div>
                 {snippet}
               </div></div>"#
        )
    }

    fn page(rows: &[String]) -> DomTree {
        DomTree::from_html(&format!("<html><body>{}</body></html>", rows.join("\n"))).unwrap()
    }

    fn extractor() -> SearchExtractor {
        SearchExtractor::default()
            .with_reference_time(Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_redirect_links_are_unwrapped() {
        let dom = page(&[result_row(
            "Rust Programming Language",
            "//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc",
            Some("A language empowering everyone."),
            None,
        )]);
        let page = extractor().extract(&dom).unwrap();

        assert_eq!(page.results.len(), 1);
        let record = &page.results[0];
        assert_eq!(record.title, "Rust Programming Language");
        assert_eq!(record.url.as_str(), "https://www.rust-lang.org/");
        assert_eq!(record.snippet, "A language empowering everyone.");
        assert_eq!(record.published_at, None);
    }

    #[test]
    fn test_results_keep_page_order() {
        let rows: Vec<String> = (1..=5)
            .map(|n| {
                result_row(
                    &format!("Title {}", n),
                    &format!("https://site{}.example/", n),
                    Some("text"),
                    None,
                )
            })
            .collect();
        let page = extractor().extract(&page(&rows)).unwrap();

        let titles: Vec<&str> = page.results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Title 1", "Title 2", "Title 3", "Title 4", "Title 5"]);
    }

    #[test]
    fn test_missing_snippet_is_empty() {
        let dom = page(&[result_row("No Snippet", "https://a.example/", None, None)]);
        let page = extractor().extract(&dom).unwrap();
        assert_eq!(page.results[0].snippet, "");
    }

    #[test]
    fn test_leading_relative_date_is_stripped() {
        let dom = page(&[result_row(
            "Dated",
            "https://a.example/",
            Some("3 days ago · Something happened."),
            None,
        )]);
        let record = &extractor().extract(&dom).unwrap().results[0];
        assert_eq!(record.snippet, "Something happened.");
        assert_eq!(
            record.published_at,
            Some(Utc.with_ymd_and_hms(2026, 2, 7, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_extras_timestamp() {
        let dom = page(&[result_row(
            "Stamped",
            "https://a.example/",
            Some("Snippet without a date field present."),
            Some("2026-02-10T01:24:00.0000000"),
        )]);
        let record = &extractor().extract(&dom).unwrap().results[0];
        assert_eq!(record.snippet, "Snippet without a date field present.");
        assert_eq!(
            record.published_at,
            Some(Utc.with_ymd_and_hms(2026, 2, 10, 1, 24, 0).unwrap())
        );
    }

    #[test]
    fn test_ads_are_skipped() {
        let ad = r#"<div class="result results_links result--ad">
              <a class="result__a" href="https://duckduckgo.com/y.js?ad_provider=x&u3=y">Buy now</a>
            </div>"#
            .to_string();
        let dom = page(&[ad, result_row("Organic", "https://a.example/", Some("x"), None)]);
        let page = extractor().extract(&dom).unwrap();

        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].title, "Organic");
    }

    #[test]
    fn test_missing_title_falls_back_to_display_url() {
        let row = r#"<div class="result">
              <a class="result__a" href="https://a.example/page"></a>
              <a class="result__url" href="https://a.example/page">a.example/page</a>
            </div>"#
            .to_string();
        let record = &extractor().extract(&page(&[row])).unwrap().results[0];
        assert_eq!(record.title, "a.example/page");
        assert_eq!(record.url.as_str(), "https://a.example/page");
    }

    #[test]
    fn test_missing_url_falls_back_to_display_link() {
        let row = r#"<div class="result">
              <a class="result__a">Title Only</a>
              <a class="result__url" href="https://b.example/">b.example</a>
            </div>"#
            .to_string();
        let record = &extractor().extract(&page(&[row])).unwrap().results[0];
        assert_eq!(record.title, "Title Only");
        assert_eq!(record.url.as_str(), "https://b.example/");
    }

    #[test]
    fn test_container_without_url_is_skipped() {
        let rows = vec![
            r#"<div class="result"><a class="result__a" href="javascript:void(0)">Broken</a></div>"#
                .to_string(),
            result_row("Good", "https://a.example/", Some("x"), None),
        ];
        let page = extractor().extract(&page(&rows)).unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].title, "Good");
    }

    #[test]
    fn test_drifted_field_selectors_fail() {
        let rows: Vec<String> = ["One", "Two"]
            .iter()
            .map(|title| {
                format!(
                    r#"<div class="result"><h2><a class="result__title-link" href="https://a.example/">{}</a></h2></div>"#,
                    title
                )
            })
            .collect();
        assert!(matches!(
            extractor().extract(&page(&rows)),
            Err(ExtractError::ExtractionFailure(_))
        ));
    }

    #[test]
    fn test_unusable_containers_with_marker_give_empty_page() {
        let rows = vec![
            r#"<div class="result"><span>placeholder</span></div>"#.to_string(),
            r#"<div class="no-results">No results.</div>"#.to_string(),
        ];
        let page = extractor().extract(&page(&rows)).unwrap();
        assert!(page.results.is_empty());
    }

    #[test]
    fn test_only_ads_is_empty_page() {
        let ad = r#"<div class="result result--ad">
              <a class="result__a" href="https://duckduckgo.com/y.js?ad_provider=x">Buy now</a>
            </div>"#
            .to_string();
        let page = extractor().extract(&page(&[ad])).unwrap();
        assert!(page.results.is_empty());
    }

    #[test]
    fn test_relative_href_resolves_against_base() {
        let dom = page(&[result_row("Relative", "/about", Some("x"), None)]);
        let base = Url::parse("https://example.com/blog/post").unwrap();
        let page = extractor().extract_with_base(&dom, &base, "q").unwrap();
        assert_eq!(page.results[0].url.as_str(), "https://example.com/about");
        assert_eq!(page.query, "q");
    }

    #[test]
    fn test_no_results_marker_gives_empty_page() {
        let dom = DomTree::from_html(
            r#"<html><body><div class="no-results">No results.</div></body></html>"#,
        )
        .unwrap();
        let page = extractor().extract(&dom).unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.pagination_token, None);
    }

    #[test]
    fn test_unrecognised_layout_fails() {
        let dom = DomTree::from_html("<html><body><h1>Welcome</h1><p>Nothing</p></body></html>")
            .unwrap();
        assert!(matches!(
            extractor().extract(&dom),
            Err(ExtractError::ExtractionFailure(_))
        ));
    }

    #[test]
    fn test_pagination_token() {
        let nav = r#"<div class="nav-link"><form action="/html/" method="post">
            <input type="submit" class="btn btn--alt" value="Next">
            <input type="hidden" name="q" value="rust">
            <input type="hidden" name="s" value="10">
            <input type="hidden" name="dc" value="11">
            <input type="hidden" name="vqd" value="4-2873">
            </form></div>"#
            .to_string();
        let dom = page(&[result_row("One", "https://a.example/", Some("x"), None), nav]);
        let page = extractor().extract(&dom).unwrap();
        assert_eq!(page.pagination_token.as_deref(), Some("4-2873"));
        assert_eq!(page.next_offset, Some(10));
        assert!(page.has_next_page());
    }

    #[test]
    fn test_extract_search_page_maps_classification() {
        assert_eq!(
            extract_search_page(ClassifiedResponse::RateLimited),
            Err(ExtractError::RateLimited)
        );
        assert_eq!(
            extract_search_page(ClassifiedResponse::Blocked {
                reason: "captcha".to_string()
            }),
            Err(ExtractError::Blocked {
                reason: "captcha".to_string()
            })
        );
        assert_eq!(
            extract_search_page(ClassifiedResponse::Empty { status: 500 }),
            Err(ExtractError::EmptyResponse { status: 500 })
        );
    }

    #[test]
    fn test_extract_search_page_ok() {
        let html = format!(
            "<html><body>{}</body></html>",
            result_row("One", "https://a.example/", Some("x"), None)
        );
        let response = ClassifiedResponse::Ok {
            body: html.into_bytes(),
            base_url: Url::parse("https://html.duckduckgo.com/html/").unwrap(),
        };
        let page = extract_search_page(response).unwrap();
        assert_eq!(page.results.len(), 1);
    }
}
