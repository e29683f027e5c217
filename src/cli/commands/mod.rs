//! Command implementations.

pub mod completions;
pub mod export;
pub mod import;
pub mod preview;
pub mod share;
pub mod validate;
pub mod version;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

use crate::config::resolve_data_dir;
use crate::error::{Error, Result};
use crate::store::Stores;

/// Open the JSON stores under the resolved data directory.
pub(crate) fn open_stores(data_dir: Option<&Path>) -> Result<Stores> {
    let dir = resolve_data_dir(data_dir)?;
    tracing::debug!(dir = %dir.display(), "Opening stores");
    Ok(Stores::open_dir(&dir))
}

/// Ask a yes/no question on the terminal.
///
/// Returns `None` when stdin is not interactive, so callers decide how a
/// non-interactive run behaves.
pub(crate) fn confirm(prompt: &str) -> Result<Option<bool>> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Ok(None);
    }

    eprint!("{prompt} [y/N] ");
    io::stderr()
        .flush()
        .map_err(|e| Error::Other(format!("Failed to write prompt: {e}")))?;

    let mut answer = String::new();
    stdin
        .lock()
        .read_line(&mut answer)
        .map_err(|e| Error::Other(format!("Failed to read answer: {e}")))?;

    Ok(Some(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    )))
}

/// Print a JSON payload on stdout.
pub(crate) fn print_json(payload: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string(payload)?);
    Ok(())
}
