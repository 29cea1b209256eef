//! Configuration module for nanoserp
//!
//! Loads, parses, and validates the optional TOML configuration file. The
//! `[http]` table configures the HTTP collaborator; the `[markers]` table
//! holds the "no results" and block-page markers used by the classifier
//! and the search extractor.
//!
//! # Example
//!
//! ```no_run
//! use nanoserp::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("nanoserp.toml")).unwrap();
//! println!("Searching via {}", config.http.search_endpoint);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, HttpConfig, MarkerConfig, DEFAULT_SEARCH_ENDPOINT, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_or_default, load_config_with_hash, parse_config,
};
pub use validation::{compile_selector, compile_selectors, validate, validate_selector};
