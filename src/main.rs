//! nanoserp main entry point
//!
//! Command-line interface for searching DuckDuckGo and scraping pages to
//! markdown.

use clap::{Parser, Subcommand};
use nanoserp::config::{compute_config_hash, load_config_or_default};
use nanoserp::output::{format_scraped_page, format_search_page, to_json};
use nanoserp::{DateFilter, NanoserpClient, NanoserpError, SearchRequest};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// nanoserp: search results and page scraping from the command line
#[derive(Parser, Debug)]
#[command(name = "nanoserp")]
#[command(version)]
#[command(about = "Search DuckDuckGo and scrape pages to markdown", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to TOML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Print records as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Request timeout in seconds, overriding the configuration
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search DuckDuckGo
    Search {
        /// Search query
        query: String,

        /// Date filter: d/day, w/week, m/month, y/year
        #[arg(long)]
        date_filter: Option<String>,

        /// Result offset for pagination
        #[arg(long, default_value_t = 0)]
        offset: u32,

        /// Session token from a previous page
        #[arg(long)]
        token: Option<String>,
    },

    /// Scrape a webpage to markdown
    Scrape {
        /// URL to scrape
        url: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(retryable) = e.downcast_ref::<NanoserpError>().filter(|e| e.is_retryable()) {
                tracing::debug!("Retryable failure: {:?}", retryable);
            }
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only results.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("nanoserp=info,warn"),
            1 => EnvFilter::new("nanoserp=debug,info"),
            2 => EnvFilter::new("nanoserp=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config_or_default(cli.config.as_deref())?;
    if let Some(path) = &cli.config {
        let hash = compute_config_hash(path)?;
        tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            hash
        );
    }

    let mut client = NanoserpClient::new(config)?;
    if let Some(secs) = cli.timeout {
        client = client.with_timeout(Duration::from_secs(secs));
    }

    match cli.command {
        Command::Search {
            query,
            date_filter,
            offset,
            token,
        } => {
            let date_filter = date_filter
                .as_deref()
                .map(str::parse::<DateFilter>)
                .transpose()
                .map_err(anyhow::Error::msg)?;

            let request = SearchRequest::new(query)
                .with_date_filter(date_filter)
                .with_offset(offset)
                .with_token(token);
            let page = client.search(&request).await?;

            if cli.json {
                println!("{}", to_json(&page)?);
            } else {
                println!("{}", format_search_page(&page));
            }
        }
        Command::Scrape { url } => {
            let page = client.scrape(&url).await?;

            if cli.json {
                println!("{}", to_json(&page)?);
            } else {
                println!("{}", format_scraped_page(&page));
            }
        }
    }

    Ok(())
}
