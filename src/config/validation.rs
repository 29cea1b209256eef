use crate::config::types::{Config, HttpConfig, MarkerConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Longest request timeout accepted (seconds)
const MAX_TIMEOUT_SECS: u64 = 300;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_marker_config(&config.markers)?;
    Ok(())
}

/// Validates HTTP collaborator configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 || config.timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and {}, got {}",
            MAX_TIMEOUT_SECS, config.timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    let endpoint = Url::parse(&config.search_endpoint).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid search_endpoint '{}': {}",
            config.search_endpoint, e
        ))
    })?;

    if endpoint.scheme() != "https" && endpoint.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "search_endpoint '{}' must use HTTP or HTTPS",
            config.search_endpoint
        )));
    }

    Ok(())
}

/// Validates that every marker selector compiles and no phrase is blank
fn validate_marker_config(config: &MarkerConfig) -> Result<(), ConfigError> {
    for selector in config
        .no_results_selectors
        .iter()
        .chain(config.block_selectors.iter())
    {
        validate_selector(selector)?;
    }

    for phrase in config
        .no_results_phrases
        .iter()
        .chain(config.block_phrases.iter())
    {
        if phrase.trim().is_empty() {
            return Err(ConfigError::Validation(
                "marker phrases cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Checks that a CSS selector parses
pub fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    compile_selector(selector).map(|_| ())
}

/// Compiles a configured CSS selector
pub fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

/// Compiles a list of configured CSS selectors, failing on the first bad one
pub fn compile_selectors(selectors: &[String]) -> Result<Vec<Selector>, ConfigError> {
    selectors.iter().map(|s| compile_selector(s)).collect()
}
