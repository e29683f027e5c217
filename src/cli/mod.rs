//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::sync::{ConflictAction, ImportMode, ItemOverride, ResolutionStrategy};

pub mod commands;

/// stateport - Versioned export and conflict-aware import of workspace state
#[derive(Parser, Debug)]
#[command(name = "stateport", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory holding the stores (default: ~/.stateport/data)
    #[arg(long, global = true, env = "STATEPORT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export every collection to an archive
    Export {
        /// Destination (default: ./stateport-export-YYYY-MM-DD.stateport)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file without asking
        #[arg(long)]
        force: bool,
    },

    /// Check an archive without touching any data
    Validate {
        /// Archive to check
        file: PathBuf,
    },

    /// Show what importing an archive would collide with
    Preview {
        /// Archive to preview
        file: PathBuf,
    },

    /// Import an archive
    Import(ImportArgs),

    /// Share single workflows and nodes
    Share {
        #[command(subcommand)]
        command: ShareCommands,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Import
// ============================================================================

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Archive to import
    pub file: PathBuf,

    /// merge keeps local data, replace substitutes every collection
    #[arg(long, value_enum, default_value_t)]
    pub mode: ModeArg,

    /// What to do with items whose ID already exists locally
    #[arg(long, value_enum, default_value_t)]
    pub default_action: ActionArg,

    /// Per-item action, as TYPE:ID=ACTION (repeatable)
    #[arg(long = "override", value_name = "TYPE:ID=ACTION", value_parser = parse_override)]
    pub overrides: Vec<ItemOverride>,

    /// Skip the confirmation for replace imports
    #[arg(short, long)]
    pub yes: bool,
}

impl ImportArgs {
    /// The resolution strategy these flags describe.
    #[must_use]
    pub fn strategy(&self) -> ResolutionStrategy {
        ResolutionStrategy {
            mode: self.mode.into(),
            default_action: self.default_action.into(),
            item_overrides: self.overrides.clone(),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModeArg {
    #[default]
    Merge,
    Replace,
}

impl From<ModeArg> for ImportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Merge => Self::Merge,
            ModeArg::Replace => Self::Replace,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActionArg {
    #[default]
    Skip,
    Overwrite,
    KeepBoth,
}

impl From<ActionArg> for ConflictAction {
    fn from(action: ActionArg) -> Self {
        match action {
            ActionArg::Skip => Self::Skip,
            ActionArg::Overwrite => Self::Overwrite,
            ActionArg::KeepBoth => Self::KeepBoth,
        }
    }
}

fn parse_override(s: &str) -> Result<ItemOverride, String> {
    s.parse()
}

// ============================================================================
// Share Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ShareCommands {
    /// Write one workflow to a share file
    ExportWorkflow {
        /// Workflow ID
        id: String,

        /// Destination file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write one node of a workflow to a share file
    ExportNode {
        /// Workflow ID
        workflow: String,

        /// Node ID
        node: String,

        /// Destination file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import a shared workflow as a new workflow
    ImportWorkflow {
        /// Share file
        file: PathBuf,
    },

    /// Append a shared node to a workflow
    ImportNode {
        /// Share file
        file: PathBuf,

        /// Target workflow ID
        #[arg(long)]
        workflow: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityKind;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_import_flags_build_strategy() {
        let cli = Cli::parse_from([
            "stateport",
            "import",
            "backup.stateport",
            "--default-action",
            "keep-both",
            "--override",
            "project:p1=skip",
            "--override",
            "workflow:w1=overwrite",
        ]);
        let Commands::Import(args) = cli.command else {
            panic!("expected import");
        };

        let strategy = args.strategy();
        assert_eq!(strategy.mode, ImportMode::Merge);
        assert_eq!(strategy.default_action, ConflictAction::KeepBoth);
        assert_eq!(
            strategy.action_for(EntityKind::Workflow, "w1"),
            ConflictAction::Overwrite
        );
    }

    #[test]
    fn test_bad_override_is_rejected() {
        let result = Cli::try_parse_from(["stateport", "import", "a.stateport", "--override", "p1"]);
        assert!(result.is_err());
    }
}
