//! # DP Headlines
//!
//! Fetches The Daily Pennsylvanian home page once per run, extracts the top
//! headline of each tracked section, and records the result under today's
//! date in a JSON ledger.
//!
//! ## Usage
//!
//! ```sh
//! dp_headlines                       # data/daily_pennsylvanian_headlines.json
//! dp_headlines -c dp.yaml --no-tree  # settings from a YAML file
//! ```
//!
//! Scheduling (e.g. a daily timer) is left to the caller.
//!
//! ## Architecture
//!
//! 1. **Setup**: Logging, configuration, data directory check
//! 2. **Fetching**: One HTTP GET with a custom `User-Agent`
//! 3. **Extraction**: Heading match + next link, per section
//! 4. **Ledger**: Lock, load, upsert today's record, save atomically
//! 5. **Report**: Log the directory tree and ledger contents
//!
//! A failed fetch skips step 4 and the run still exits cleanly. A data
//! directory that cannot be created, or a ledger that cannot be read, locked,
//! or written, ends the run with an error.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, fmt as tfmt, fmt::time::UtcTime, layer::SubscriberExt, util::SubscriberInitExt,
};

mod cli;
mod config;
mod extractor;
mod ledger;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cli::Cli;
use config::Config;
use ledger::{Clock, Ledger, LedgerLock, LocalClock};
use outputs::tree;
use scrapers::{FetchPage, HttpFetcher, dp};
use utils::ensure_writable_dir;

/// Console layer plus a daily-rotated plain-text log file.
fn init_tracing(log_file: &Path) -> WorkerGuard {
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = log_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scrape.log".to_string());
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, prefix));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tfmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(UtcTime::rfc_3339()),
        )
        .with(
            tfmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true)
                .with_timer(UtcTime::rfc_3339()),
        )
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    let _log_guard = init_tracing(&args.log_file);

    let start_time = std::time::Instant::now();
    info!("dp_headlines starting up");
    debug!(?args, "Parsed CLI arguments");

    let config = Config::resolve(&args).inspect_err(|e| {
        error!(error = %e, "Invalid configuration");
    })?;
    info!(
        url = %config.url,
        mode = ?config.extraction.mode,
        policy = %config.extraction.match_policy,
        targets = ?config.extraction.targets,
        "Configuration resolved"
    );

    info!("Creating data directory if it does not exist");
    if let Err(e) = ensure_writable_dir(&config.data_dir).await {
        error!(
            path = %config.data_dir.display(),
            error = %e,
            "Failed to create data directory"
        );
        return Err(e);
    }

    let ledger_path = config.ledger_path();
    let fetcher = HttpFetcher::new(&config.user_agent, config.request_timeout())?;
    run(&config, &ledger_path, &fetcher, &LocalClock).await?;

    if !args.no_tree {
        match std::env::current_dir() {
            Ok(cwd) => tree::log_tree(&cwd),
            Err(e) => warn!(error = %e, "Cannot resolve working directory"),
        }
    }
    if let Err(e) = tree::log_data_file(&ledger_path).await {
        warn!(path = %ledger_path.display(), error = %e, "Could not read data file");
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, "Scrape complete");
    info!("Exiting");
    Ok(())
}

/// One lock → load → scrape → upsert → save cycle.
///
/// The ledger is loaded before fetching so a corrupt file fails the run
/// without touching the network. A failed scrape leaves the file untouched.
#[instrument(level = "info", skip_all, fields(ledger = %ledger_path.display()))]
async fn run(
    config: &Config,
    ledger_path: &Path,
    fetcher: &impl FetchPage,
    clock: &impl Clock,
) -> Result<(), Box<dyn Error>> {
    let _lock = LedgerLock::acquire(ledger_path).inspect_err(|e| {
        error!(error = %e, "Could not lock ledger");
    })?;

    info!("Loading daily ledger");
    let mut ledger = Ledger::load(ledger_path).inspect_err(|e| {
        error!(error = %e, "Failed to load ledger; refusing to overwrite history");
    })?;
    if ledger.is_empty() {
        info!("Starting a new history");
    } else if let Some((first, _)) = ledger.iter().next() {
        info!(since = %first, dates = ledger.len(), "Ledger history");
    }

    info!("Starting scrape");
    let extractor = config.extraction.extractor();
    let record = match dp::scrape_data_point(fetcher, config, &extractor).await {
        Ok(record) => record,
        Err(e) => {
            error!(error = %e, "Failed to scrape data point; ledger left unchanged");
            return Ok(());
        }
    };

    let found = record.found_count();
    let date = ledger.upsert_today(record, clock);
    debug!(%date, record = ?ledger.get(date), "Upserted today's record");
    ledger.save(ledger_path)?;
    info!(%date, found, dates = ledger.len(), "Saved daily ledger");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::FixedClock;
    use chrono::NaiveDate;
    use std::cell::Cell;
    use std::fs;

    const PAGE: &str = "<h2>News</h2><p>x</p><a>B</a><h3>Sports</h3><a>Quakers win</a>";

    struct StubFetcher {
        body: Result<&'static str, &'static str>,
        calls: Cell<usize>,
    }

    impl StubFetcher {
        fn new(body: Result<&'static str, &'static str>) -> Self {
            Self {
                body,
                calls: Cell::new(0),
            }
        }
    }

    impl FetchPage for StubFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, Box<dyn Error>> {
            self.calls.set(self.calls.get() + 1);
            match self.body {
                Ok(body) => Ok(body.to_string()),
                Err(msg) => Err(msg.into()),
            }
        }
    }

    fn jan(day: u32) -> FixedClock {
        FixedClock(NaiveDate::from_ymd_opt(2024, 1, day).unwrap())
    }

    #[tokio::test]
    async fn test_run_appends_one_new_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headlines.json");
        fs::write(&path, r#"{"2024-01-01": {"News": "A"}}"#).unwrap();

        let fetcher = StubFetcher::new(Ok(PAGE));
        run(&Config::default(), &path, &fetcher, &jan(2)).await.unwrap();

        assert_eq!(fetcher.calls.get(), 1);
        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            on_disk,
            serde_json::json!({
                "2024-01-01": {"News": "A"},
                "2024-01-02": {"Featured": "", "News": "B", "Opinion": "", "Sports": "Quakers win"}
            })
        );
    }

    #[tokio::test]
    async fn test_run_fetch_failure_leaves_ledger_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headlines.json");
        let before = "{\"2024-01-01\": {\"News\": \"A\"}}";
        fs::write(&path, before).unwrap();

        let fetcher = StubFetcher::new(Err("503 Service Unavailable"));
        run(&Config::default(), &path, &fetcher, &jan(2)).await.unwrap();

        assert_eq!(fetcher.calls.get(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_run_corrupt_ledger_fails_before_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headlines.json");
        fs::write(&path, r#"{"2024-01-01": {"News": "A"#).unwrap();

        let fetcher = StubFetcher::new(Ok(PAGE));
        let result = run(&Config::default(), &path, &fetcher, &jan(2)).await;

        assert!(result.is_err());
        assert_eq!(fetcher.calls.get(), 0);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            r#"{"2024-01-01": {"News": "A"#
        );
    }

    #[tokio::test]
    async fn test_run_refuses_while_locked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headlines.json");
        let _held = LedgerLock::acquire(&path).unwrap();

        let fetcher = StubFetcher::new(Ok(PAGE));
        assert!(run(&Config::default(), &path, &fetcher, &jan(2)).await.is_err());
        assert_eq!(fetcher.calls.get(), 0);
        assert!(!path.exists());
    }
}
