//! Share command implementations (single workflows and nodes).

use std::path::Path;

use colored::Colorize;

use super::{open_stores, print_json};
use crate::cli::ShareCommands;
use crate::error::Result;
use crate::model::Identified;
use crate::sync::share;

/// Execute share commands.
pub async fn execute(command: &ShareCommands, data_dir: Option<&Path>, json: bool) -> Result<()> {
    let stores = open_stores(data_dir)?;

    match command {
        ShareCommands::ExportWorkflow { id, output } => {
            share::export_workflow(&stores, id, output).await?;
            if json {
                return print_json(&serde_json::json!({
                    "success": true,
                    "workflow": id,
                    "path": output.display().to_string(),
                }));
            }
            println!("Shared workflow {} to {}", id.cyan(), output.display());
        }
        ShareCommands::ExportNode { workflow, node, output } => {
            share::export_node(&stores, workflow, node, output).await?;
            if json {
                return print_json(&serde_json::json!({
                    "success": true,
                    "workflow": workflow,
                    "node": node,
                    "path": output.display().to_string(),
                }));
            }
            println!(
                "Shared node {} of {} to {}",
                node.cyan(),
                workflow.cyan(),
                output.display()
            );
        }
        ShareCommands::ImportWorkflow { file } => {
            let imported = share::import_workflow(&stores, file).await?;
            if json {
                return print_json(&serde_json::json!({
                    "success": true,
                    "workflow": imported,
                }));
            }
            println!(
                "{} {} as {} ({} nodes)",
                "Imported workflow".green(),
                imported.display_name(),
                imported.id.cyan(),
                imported.nodes.len()
            );
        }
        ShareCommands::ImportNode { file, workflow } => {
            let node = share::import_node(&stores, file, workflow).await?;
            if json {
                return print_json(&serde_json::json!({
                    "success": true,
                    "workflow": workflow,
                    "node": node,
                }));
            }
            println!(
                "{} {} into {}",
                "Imported node".green(),
                node.id.cyan(),
                workflow.cyan()
            );
        }
    }

    Ok(())
}
