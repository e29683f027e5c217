//! Version command implementation.

use crate::config::APP_VERSION;
use crate::error::Result;
use crate::version::{CURRENT_FORMAT_VERSION, MIN_SUPPORTED_VERSION};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionOutput<'a> {
    version: &'a str,
    build: &'a str,
    format_version: &'a str,
    min_format_version: &'a str,
}

/// Execute the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let build = if cfg!(debug_assertions) {
        "dev"
    } else {
        "release"
    };

    if json {
        let output = VersionOutput {
            version: APP_VERSION,
            build,
            format_version: CURRENT_FORMAT_VERSION,
            min_format_version: MIN_SUPPORTED_VERSION,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
        return Ok(());
    }

    println!("stateport version {APP_VERSION} ({build})");
    println!("archive format {CURRENT_FORMAT_VERSION} (reads {MIN_SUPPORTED_VERSION} and later)");
    Ok(())
}
