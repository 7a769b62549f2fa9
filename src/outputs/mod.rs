//! End-of-run reporting.
//!
//! After a run the working directory tree and the ledger file contents are
//! written to the log, so a scheduled run's log alone shows what was
//! persisted:
//!
//! ```text
//! +--repo/
//!     +--scrape.log.2024-01-02
//!     +--data/
//!         +--daily_pennsylvanian_headlines.json
//! ```
//!
//! - [`tree`]: Directory listing and ledger dump

pub mod tree;
