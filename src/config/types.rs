use serde::Deserialize;

/// Browser user agent sent with every request (iPhone Safari)
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 18_5 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) \
     Version/18.5 Mobile/15E148 Safari/604.1";

/// DuckDuckGo's JavaScript-free results endpoint
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Main configuration structure for nanoserp
///
/// Every table and key is optional; an empty file yields [`Config::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub markers: MarkerConfig,
}

/// HTTP collaborator configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Form endpoint that search queries are POSTed to
    #[serde(rename = "search-endpoint")]
    pub search_endpoint: String,

    /// Maximum number of redirects followed per request
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            max_redirects: 10,
        }
    }
}

/// Page markers that are data rather than extraction logic
///
/// Upstream wording and markup for "no results" and block pages change
/// over time, so they are configurable instead of hard-coded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Selectors whose presence means the engine found nothing
    #[serde(rename = "no-results-selectors")]
    pub no_results_selectors: Vec<String>,

    /// Case-insensitive phrases in the page text meaning the engine found nothing
    #[serde(rename = "no-results-phrases")]
    pub no_results_phrases: Vec<String>,

    /// Case-insensitive phrases identifying a block or challenge page
    #[serde(rename = "block-phrases")]
    pub block_phrases: Vec<String>,

    /// Structural fingerprints of block or challenge pages
    #[serde(rename = "block-selectors")]
    pub block_selectors: Vec<String>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            no_results_selectors: strings(&["div.no-results", ".no-results", "[data-testid='no-results']"]),
            no_results_phrases: strings(&["No results.", "No results found for"]),
            block_phrases: strings(&[
                "Unfortunately, bots use DuckDuckGo too",
                "Please complete the following challenge",
                "unusual traffic",
                "Access Denied",
            ]),
            block_selectors: strings(&[
                ".anomaly-modal",
                ".anomaly-modal__modal",
                "#challenge-form",
                "form.challenge-form",
            ]),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
