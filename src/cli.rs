//! Command-line interface definitions.
//!
//! Every flag is optional: anything not given on the command line falls back
//! to the YAML config file (`--config`) and then to built-in defaults. See
//! [`crate::config::Config`].

use crate::extractor::MatchPolicy;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for one scrape run.
///
/// # Examples
///
/// ```sh
/// # Canonical run: four sections of the home page into data/
/// dp_headlines
///
/// # Single-headline variant against the multimedia page
/// dp_headlines --url https://www.thedp.com/multimedia --single \
///     --section Video --section Gallery --match-policy contains
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Page to scrape
    #[arg(long, env = "DP_HEADLINES_URL")]
    pub url: Option<String>,

    /// User-Agent header sent with the request
    #[arg(long, env = "DP_HEADLINES_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Directory holding the ledger file
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Ledger file name inside the data directory
    #[arg(short, long)]
    pub ledger_file: Option<String>,

    /// Section to track (repeatable); replaces the configured list
    #[arg(short, long = "section")]
    pub sections: Vec<String>,

    /// How section names are matched against heading text
    #[arg(long, value_enum)]
    pub match_policy: Option<MatchPolicy>,

    /// Record one flat headline under the first heading matching any section
    #[arg(long)]
    pub single: bool,

    /// Log file prefix; the file is rotated daily
    #[arg(long, default_value = "scrape.log")]
    pub log_file: PathBuf,

    /// Skip logging the working directory tree after the run
    #[arg(long)]
    pub no_tree: bool,
}
