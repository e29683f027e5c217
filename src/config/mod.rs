//! Configuration management.
//!
//! This module resolves where the stores keep their data and provides the
//! defaults stamped into exported archives.
//!
//! # Layout
//!
//! All collections live in one global data directory, one JSON file per
//! collection:
//! - **Data**: `~/.stateport/data/<collection>.json`
//! - **Test data**: `~/.stateport/test/` when `STATEPORT_TEST` is set
//!
//! Archives are written wherever the user points them; the default file
//! name carries the export date.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::sync::ARCHIVE_EXTENSION;

/// Version of this build, stamped into `metadata.appVersion`.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the global stateport directory location (`~/.stateport/`).
#[must_use]
pub fn global_stateport_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".stateport"))
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `STATEPORT_TEST=1` (or any non-empty
/// value other than `0`/`false`). It redirects every store to an isolated
/// directory.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("STATEPORT_TEST").is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Get the test data directory (`~/.stateport/test/`).
#[must_use]
pub fn test_data_dir() -> Option<PathBuf> {
    global_stateport_dir().map(|dir| dir.join("test"))
}

/// Resolve the data directory.
///
/// Priority:
/// 1. `explicit_dir` (the `--data-dir` flag, or `STATEPORT_DATA_DIR` through clap)
/// 2. Test mode → `~/.stateport/test/`
/// 3. Global location: `~/.stateport/data/`
///
/// # Errors
///
/// Returns [`Error::Config`] if no home directory can be determined and no
/// explicit directory was given.
pub fn resolve_data_dir(explicit_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit_dir {
        return Ok(dir.to_path_buf());
    }

    let resolved = if is_test_mode() {
        test_data_dir()
    } else {
        global_stateport_dir().map(|dir| dir.join("data"))
    };

    resolved.ok_or_else(|| {
        Error::Config("Could not determine home directory. Pass --data-dir.".to_string())
    })
}

/// Default archive file name for an export on `date`.
#[must_use]
pub fn default_archive_name(date: NaiveDate) -> String {
    format!(
        "stateport-export-{}.{ARCHIVE_EXTENSION}",
        date.format("%Y-%m-%d")
    )
}

/// Default archive path in the current directory for today's export.
#[must_use]
pub fn default_archive_path() -> PathBuf {
    PathBuf::from(default_archive_name(chrono::Local::now().date_naive()))
}
