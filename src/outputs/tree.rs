//! Directory tree and data file logging.

use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};
use walkdir::WalkDir;

/// Directories never descended into.
pub const IGNORED_DIRS: &[&str] = &[".git", "__pycache__", "target"];

/// Render `root` as an indented listing.
///
/// Each directory prints as `+--name/` followed by its files, then its
/// subdirectories. Indentation is four spaces per level and names are sorted.
pub fn render_tree(root: &Path, ignore: &[&str]) -> Vec<String> {
    let walker = WalkDir::new(root)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(e.file_type().is_dir()
                    && e.file_name().to_str().is_some_and(|n| ignore.contains(&n)))
        });

    let mut lines = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable path");
                continue;
            }
        };
        let indent = " ".repeat(4 * entry.depth());
        let name = match entry.depth() {
            0 => root
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| root.display().to_string()),
            _ => entry.file_name().to_string_lossy().into_owned(),
        };
        if entry.file_type().is_dir() {
            lines.push(format!("{indent}+--{name}/"));
        } else {
            lines.push(format!("{indent}+--{name}"));
        }
    }
    lines
}

/// Log the tree of files and directories under `root`.
#[instrument(level = "info", skip_all, fields(root = %root.display()))]
pub fn log_tree(root: &Path) {
    info!("Printing tree of files/dirs");
    for line in render_tree(root, IGNORED_DIRS) {
        info!("{}", line);
    }
}

/// Log the contents of the persisted ledger file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn log_data_file(path: &Path) -> Result<(), Box<dyn Error>> {
    info!("Printing contents of data file");
    let contents = fs::read_to_string(path).await?;
    info!("{}", contents);
    Ok(())
}
