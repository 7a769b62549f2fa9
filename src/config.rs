//! Runtime configuration.
//!
//! Settings come from an optional YAML file and are then overridden by any
//! command-line flags. Every field has a default, so an empty file (or no file)
//! yields the canonical deployment: four sections of the Daily Pennsylvanian
//! home page, whole-word matching on `h2`/`h3` headings.
//!
//! ```yaml
//! url: https://www.thedp.com/multimedia
//! user_agent: cis3500-scraper
//! data_dir: data
//! ledger_file: daily_pennsylvanian_headlines.json
//! request_timeout_secs: 30
//! extraction:
//!   mode: single
//!   targets: [Video, Gallery]
//!   match_policy: contains
//!   heading_levels: [1, 2, 3, 4, 5, 6]
//! ```

use crate::cli::Cli;
use crate::extractor::{HeadlineExtractor, MatchPolicy};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

pub const DEFAULT_URL: &str = "https://www.thedp.com";
pub const DEFAULT_USER_AGENT: &str = "cis3500-scraper";

/// Shape of each daily record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// One headline per target, stored as a `{section: headline}` object.
    #[default]
    Sections,
    /// One headline under the first heading matching any target, stored flat.
    Single,
}

/// How headlines are located on the fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub mode: ExtractionMode,
    /// Section names (in `sections` mode) or heading keywords (in `single` mode).
    pub targets: Vec<String>,
    pub match_policy: MatchPolicy,
    pub heading_levels: Vec<u8>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::Sections,
            targets: ["Featured", "News", "Sports", "Opinion"]
                .into_iter()
                .map(String::from)
                .collect(),
            match_policy: MatchPolicy::WholeWord,
            heading_levels: vec![2, 3],
        }
    }
}

impl ExtractionConfig {
    pub fn extractor(&self) -> HeadlineExtractor {
        HeadlineExtractor::new(self.match_policy, self.heading_levels.iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub url: String,
    pub user_agent: String,
    pub data_dir: PathBuf,
    pub ledger_file: String,
    pub request_timeout_secs: u64,
    pub extraction: ExtractionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            data_dir: PathBuf::from("data"),
            ledger_file: "daily_pennsylvanian_headlines.json".to_string(),
            request_timeout_secs: 30,
            extraction: ExtractionConfig::default(),
        }
    }
}

impl Config {
    /// Read a YAML config file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        let config: Config = serde_yaml::from_str(&text)
            .map_err(|e| format!("invalid config {}: {}", path.display(), e))?;
        info!("Loaded configuration file");
        Ok(config)
    }

    /// Build the effective configuration: file (if any), then CLI overrides.
    pub fn resolve(cli: &Cli) -> Result<Self, Box<dyn Error>> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        debug!(?config, "Resolved configuration");
        Ok(config)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.url {
            self.url = url.clone();
        }
        if let Some(user_agent) = &cli.user_agent {
            self.user_agent = user_agent.clone();
        }
        if let Some(data_dir) = &cli.data_dir {
            self.data_dir = data_dir.clone();
        }
        if let Some(ledger_file) = &cli.ledger_file {
            self.ledger_file = ledger_file.clone();
        }
        if !cli.sections.is_empty() {
            self.extraction.targets = cli.sections.clone();
        }
        if let Some(policy) = cli.match_policy {
            self.extraction.match_policy = policy;
        }
        if cli.single {
            self.extraction.mode = ExtractionMode::Single;
        }
    }

    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        let url = Url::parse(&self.url).map_err(|e| format!("invalid url {:?}: {}", self.url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("url must be http(s), got {:?}", self.url).into());
        }
        if self.user_agent.trim().is_empty() {
            return Err("user_agent must not be empty".into());
        }
        if self.ledger_file.trim().is_empty() {
            return Err("ledger_file must not be empty".into());
        }
        let mut components = Path::new(&self.ledger_file).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(format!(
                "ledger_file must be a plain file name inside data_dir, got {:?}",
                self.ledger_file
            )
            .into());
        }
        if self.extraction.targets.iter().all(|t| t.trim().is_empty()) {
            return Err("at least one non-empty extraction target is required".into());
        }
        if self.extraction.heading_levels.is_empty() {
            return Err("heading_levels must not be empty".into());
        }
        if let Some(bad) = self
            .extraction
            .heading_levels
            .iter()
            .find(|l| !(1..=6).contains(*l))
        {
            return Err(format!("heading level {} is outside h1..h6", bad).into());
        }
        Ok(())
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(&self.ledger_file)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
