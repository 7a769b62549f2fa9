//! Append-only, date-keyed history of captured headlines.
//!
//! The ledger is a single pretty-printed JSON object on disk:
//!
//! ```text
//! {
//!   "2024-01-01": { "News": "A", "Sports": "" },
//!   "2024-01-02": { "News": "B", "Sports": "Quakers win" }
//! }
//! ```
//!
//! # Lifecycle
//!
//! 1. [`LedgerLock::acquire`] guards the file against a concurrent run
//! 2. [`Ledger::load`] reads the whole history (missing file means empty)
//! 3. [`Ledger::upsert_today`] writes exactly one record for the current date
//! 4. [`Ledger::save`] replaces the file through a temp file and rename
//!
//! Entries are never removed. Writing a date that already exists replaces its
//! record.

use crate::models::DailyRecord;
use crate::utils::looks_truncated;
use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Errors that touch the integrity of persisted history.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to read ledger {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("ledger {path} is not valid JSON history: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write ledger {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("ledger {path} is locked by another run (lock file {lock})")]
    Locked { path: PathBuf, lock: PathBuf },
}

impl LedgerError {
    fn write(path: &Path, source: io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Source of "today" for [`Ledger::upsert_today`].
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// The local wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one date.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Ordered mapping of calendar date to the record captured that day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: BTreeMap<NaiveDate, DailyRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the ledger at `path`.
    ///
    /// A missing file yields an empty ledger. A file that exists but cannot be
    /// read or parsed is an error; nothing is partially loaded.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No ledger file yet; starting empty");
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(LedgerError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let entries: BTreeMap<NaiveDate, DailyRecord> =
            serde_json::from_str(&text).map_err(|source| {
                if looks_truncated(&source) {
                    warn!(error = %source, "Ledger file looks truncated");
                }
                LedgerError::Parse {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        info!(dates = entries.len(), "Loaded ledger");
        Ok(Self { entries })
    }

    /// Record `record` under the clock's current date, replacing any record
    /// already stored for that date. The clock is read once.
    pub fn upsert_today(&mut self, record: DailyRecord, clock: &impl Clock) -> NaiveDate {
        let today = clock.today();
        self.upsert(today, record);
        today
    }

    /// Insert or overwrite the record for `date`, returning the one it replaced.
    pub fn upsert(&mut self, date: NaiveDate, record: DailyRecord) -> Option<DailyRecord> {
        let previous = self.entries.insert(date, record);
        if let Some(ref old) = previous {
            debug!(%date, ?old, "Replaced existing record");
        }
        previous
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.entries.get(&date)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &DailyRecord)> {
        self.entries.iter()
    }

    /// Serialize the whole history to `path`.
    ///
    /// The JSON is written to a temp file in the same directory, synced, and
    /// renamed over `path`, so an interrupted save leaves the old file intact.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let mut json = serde_json::to_string_pretty(&self.entries)?;
        json.push('\n');

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| LedgerError::write(path, e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| LedgerError::write(path, e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| LedgerError::write(path, e))?;
        tmp.persist(path)
            .map_err(|e| LedgerError::write(path, e.error))?;

        info!(dates = self.entries.len(), bytes = json.len(), "Saved ledger");
        Ok(())
    }
}

/// Advisory lock held for the duration of one load→upsert→save cycle.
///
/// The lock is an OS file lock on `<ledger>.lock`. The kernel releases it when
/// the handle closes, including when the process is killed, so a leftover
/// lock file from a dead run never blocks the next one.
#[derive(Debug)]
pub struct LedgerLock {
    file: fs::File,
    lock_path: PathBuf,
}

impl LedgerLock {
    pub fn acquire(ledger_path: &Path) -> Result<Self, LedgerError> {
        let lock_path = lock_path_for(ledger_path);

        let mut file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| LedgerError::write(&lock_path, e))?;

        match file.try_lock() {
            Ok(()) => {}
            Err(fs::TryLockError::WouldBlock) => {
                return Err(LedgerError::Locked {
                    path: ledger_path.to_path_buf(),
                    lock: lock_path,
                });
            }
            Err(fs::TryLockError::Error(e)) => return Err(LedgerError::write(&lock_path, e)),
        }

        // Best effort: the pid only tells a human which run holds the lock.
        let _ = file.set_len(0).and_then(|_| writeln!(file, "{}", std::process::id()));
        debug!(lock = %lock_path.display(), "Acquired ledger lock");
        Ok(Self { file, lock_path })
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!(lock = %self.lock_path.display(), error = %e, "Failed to release ledger lock");
        }
    }
}

fn lock_path_for(ledger_path: &Path) -> PathBuf {
    let mut lock_os = ledger_path.as_os_str().to_owned();
    lock_os.push(".lock");
    PathBuf::from(lock_os)
}
