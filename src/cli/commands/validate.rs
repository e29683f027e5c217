//! Validate command implementation.

use std::path::Path;

use colored::Colorize;

use super::print_json;
use crate::error::{Error, Result};
use crate::sync::read_json;
use crate::validate::validate_archive;

/// Check an archive file without opening any store.
///
/// # Errors
///
/// Returns [`Error::Validation`] listing every violation, or a read or
/// format error if the file is not JSON.
pub async fn execute(file: &Path, json: bool) -> Result<()> {
    let value = read_json(file).await?;
    let report = validate_archive(&value);

    if !report.is_valid() {
        if !json {
            for warning in &report.warnings {
                eprintln!("{} {warning}", "warning:".yellow());
            }
        }
        return Err(Error::Validation {
            errors: report.errors,
        });
    }

    if json {
        return print_json(&serde_json::json!({
            "success": true,
            "path": file.display().to_string(),
            "valid": true,
            "warnings": report.warnings,
        }));
    }

    println!("{} {}", "Valid archive:".green().bold(), file.display());
    for warning in &report.warnings {
        println!("  {} {warning}", "warning:".yellow());
    }
    Ok(())
}
