//! Preview command implementation.

use std::path::Path;

use colored::Colorize;

use super::{open_stores, print_json};
use crate::error::Result;
use crate::sync::{ImportPreview, Importer};

/// Validate an archive and list its collisions with live data.
///
/// Never writes to the stores.
pub async fn execute(file: &Path, data_dir: Option<&Path>, json: bool) -> Result<()> {
    let importer = Importer::new(open_stores(data_dir)?);
    let preview = importer.preview(file).await?;

    if json {
        return print_json(&serde_json::json!({
            "success": true,
            "path": file.display().to_string(),
            "preview": preview,
        }));
    }

    print_preview(&preview);
    Ok(())
}

/// Human-readable preview, shared with the import command.
pub(crate) fn print_preview(preview: &ImportPreview) {
    let meta = &preview.metadata;
    println!("{}", "Archive".cyan().bold());
    println!("  Format:   {}", meta.version);
    if !meta.app_version.is_empty() {
        println!("  Written by: stateport {}", meta.app_version);
    }
    println!("  Exported: {}", meta.exported_at);

    if let Some(warning) = &preview.version_warning {
        println!("  {} {warning}", "warning:".yellow());
    }
    for warning in &preview.warnings {
        if preview.version_warning.as_ref() != Some(warning) {
            println!("  {} {warning}", "warning:".yellow());
        }
    }

    println!();
    println!("{}", "Contents".cyan().bold());
    if preview.counts.is_empty() {
        println!("  {}", "(empty)".dimmed());
    }
    for (key, count) in &preview.counts {
        println!("  {:<26} {count}", format!("{key}:"));
    }

    println!();
    if preview.conflicts.is_empty() {
        println!("{}", "No conflicts".green());
        return;
    }

    println!(
        "{} ({})",
        "Conflicts".yellow().bold(),
        preview.conflicts.len()
    );
    for conflict in &preview.conflicts {
        let marker = if conflict.identical {
            "identical".dimmed()
        } else {
            "differs".yellow()
        };
        println!(
            "  {} {} {} [{}]",
            format!("{:<16}", conflict.kind.as_str()).dimmed(),
            conflict.id.cyan(),
            conflict.name,
            marker
        );
    }
}
