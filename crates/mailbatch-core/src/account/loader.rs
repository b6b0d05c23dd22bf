//! Account-list loader.
//!
//! The account file is UTF-8 text with one `email:secret` record per line.
//! Blank lines and lines starting with `#` are skipped silently; lines
//! without a `:` separator are skipped with a warning.

use std::path::Path;

use tracing::{info, warn};

use super::AccountRecord;
use crate::error::Result;

/// A line that looked like data but could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line_number: usize,
    /// Trimmed line content.
    pub content: String,
}

/// Result of loading an account list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedAccounts {
    /// Parsed records in file order.
    pub records: Vec<AccountRecord>,
    /// Malformed lines that were skipped.
    pub skipped: Vec<SkippedLine>,
}

impl LoadedAccounts {
    /// Whether no record could be loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse the contents of an account file.
#[must_use]
pub fn parse_accounts(contents: &str) -> LoadedAccounts {
    let mut loaded = LoadedAccounts::default();
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);

    for (index, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match AccountRecord::parse(line) {
            Some(record) => loaded.records.push(record),
            None => {
                let line_number = index + 1;
                warn!(line = line_number, content = line, "Skipping invalid account line");
                loaded.skipped.push(SkippedLine {
                    line_number,
                    content: line.to_string(),
                });
            }
        }
    }

    loaded
}

/// Load an account file from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid UTF-8.
pub async fn load_accounts(path: impl AsRef<Path>) -> Result<LoadedAccounts> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path).await?;
    let loaded = parse_accounts(&contents);
    info!(
        path = %path.display(),
        records = loaded.records.len(),
        skipped = loaded.skipped.len(),
        "Loaded account list"
    );
    Ok(loaded)
}
