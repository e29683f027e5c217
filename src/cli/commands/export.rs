//! Export command implementation.

use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::info;

use super::{confirm, open_stores, print_json};
use crate::config::{APP_VERSION, default_archive_path};
use crate::error::{Error, Result};
use crate::sync::{ExportOutcome, Exporter};

/// Export every collection to `output` (or today's default file name).
///
/// An existing destination is only replaced with `force` or after an
/// interactive yes. Declining cancels the export.
pub async fn execute(
    output: Option<&PathBuf>,
    force: bool,
    data_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    let stores = open_stores(data_dir)?;
    let path = output.cloned().unwrap_or_else(default_archive_path);

    let destination = if path.exists() && !force {
        let prompt = format!("{} already exists. Overwrite?", path.display());
        match confirm(&prompt)? {
            Some(true) => Some(path),
            Some(false) => None,
            None => {
                info!(path = %path.display(), "Destination exists, not overwriting without --force");
                None
            }
        }
    } else {
        Some(path)
    };

    let exporter = Exporter::new(stores, APP_VERSION);
    match exporter.export_to(destination.as_deref()).await? {
        ExportOutcome::Cancelled => Err(Error::Cancelled),
        ExportOutcome::Written { path, stats } => {
            if json {
                return print_json(&serde_json::json!({
                    "success": true,
                    "path": path.display().to_string(),
                    "stats": stats,
                }));
            }

            if stats.is_empty() {
                println!("{}", "Nothing to export, wrote an empty archive.".yellow());
            } else {
                println!("{}", "Export complete".green().bold());
                println!();
                for (key, count) in &stats.counts {
                    println!("  {:<26} {count}", format!("{key}:"));
                }
                println!();
                println!("  Total: {} records", stats.total());
            }
            println!("  Location: {} ({} bytes)", path.display().to_string().cyan(), stats.bytes);
            Ok(())
        }
    }
}
