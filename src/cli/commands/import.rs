//! Import command implementation.
//!
//! Drives an [`ImportSession`] through select → preview → execute so the
//! CLI follows the same step order as any other front end.

use std::path::Path;

use colored::Colorize;
use tracing::info;

use super::preview::print_preview;
use super::{confirm, open_stores, print_json};
use crate::cli::ImportArgs;
use crate::error::{Error, Result};
use crate::sync::{ImportMode, ImportSession, ImportSummary, Importer};

/// Execute the import command.
///
/// Replace imports delete live data, so they need `--yes` or an
/// interactive confirmation.
pub async fn execute(args: &ImportArgs, data_dir: Option<&Path>, json: bool) -> Result<()> {
    let strategy = args.strategy();
    let mut session = ImportSession::new(Importer::new(open_stores(data_dir)?));

    session.select_file(&args.file)?;
    let preview = session.preview().await?;
    if !json {
        print_preview(preview);
        println!();
    }

    if strategy.mode == ImportMode::Replace && !args.yes {
        match confirm("Replace import deletes every local item of the archived collections. Continue?")? {
            Some(true) => {}
            Some(false) => return Err(Error::Cancelled),
            None => {
                return Err(Error::InvalidArgument(
                    "replace import needs --yes when not running interactively".to_string(),
                ));
            }
        }
    }

    info!(mode = %strategy.mode, default_action = %strategy.default_action, "Importing");
    let summary = session.execute(&strategy).await?;

    if json {
        return print_json(&serde_json::json!({
            "success": true,
            "path": args.file.display().to_string(),
            "mode": strategy.mode,
            "summary": summary,
        }));
    }

    print_summary(strategy.mode, &summary);
    Ok(())
}

fn print_summary(mode: ImportMode, summary: &ImportSummary) {
    println!("{} ({mode})", "Import complete".green().bold());
    println!();

    for (kind, stats) in &summary.collections {
        if stats.total() == 0 && stats.removed == 0 {
            continue;
        }
        let mut line = format!(
            "  {:<26} {} imported",
            format!("{}:", kind.collection_key()),
            stats.imported
        );
        if stats.skipped > 0 {
            line.push_str(&format!(", {} skipped", stats.skipped));
        }
        if stats.overwritten > 0 {
            line.push_str(&format!(", {} overwritten", stats.overwritten));
        }
        if stats.removed > 0 {
            line.push_str(&format!(", {} removed", stats.removed));
        }
        println!("{line}");
    }

    for (key, written) in [
        ("settings", summary.settings),
        ("automationServerConfig", summary.automation_server_config),
        ("deployPreferences", summary.deploy_preferences),
    ] {
        if written {
            println!("  {:<26} {}", format!("{key}:"), "restored".cyan());
        }
    }

    println!();
    println!(
        "  Total: {} imported, {} skipped, {} overwritten",
        summary.total_imported(),
        summary.total_skipped(),
        summary.total_overwritten()
    );
    if mode == ImportMode::Replace {
        println!("  Removed: {}", summary.total_removed());
    }
}
