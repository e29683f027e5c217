//! Data models for stateport.
//!
//! This module contains the entity types that travel inside an archive:
//! - Projects and their per-project AI settings and deployment configs
//! - Workflows, worktree templates, custom step templates
//! - AI providers, prompt templates, CLI tool configs
//! - Automation actions and permissions
//! - Singleton configs (settings, automation server, deploy preferences)
//! - Deploy accounts (exported without tokens, never imported)
//!
//! Every entity keeps the fields it does not model in an `extra` map, so
//! an export followed by an import is lossless.

pub mod archive;
pub mod integration;
pub mod preferences;
pub mod project;
pub mod timestamp;
pub mod workflow;

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use archive::{Archive, CollectionSet, ExportType, Metadata};
pub use integration::{
    AiProvider, AutomationAction, AutomationPermission, CliToolConfig, DeployAccount,
    PromptTemplate,
};
pub use preferences::{AutomationServerConfig, DeployPreferences, Settings};
pub use project::{DeploymentConfig, Project, ProjectAiSettings};
pub use timestamp::Timestamp;
pub use workflow::{StepTemplate, Workflow, WorkflowEdge, WorkflowNode, WorktreeTemplate};

/// Identifier-bearing collection types.
///
/// Serialized as the camelCase tag used in conflict reports and item
/// overrides (`"project"`, `"worktreeTemplate"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Project,
    Workflow,
    WorktreeTemplate,
    StepTemplate,
    AiProvider,
    PromptTemplate,
    CliTool,
    AutomationAction,
    AutomationPermission,
    DeploymentConfig,
    ProjectAiSettings,
}

/// How a collection reconciles colliding identifiers in merge mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Honors skip / overwrite / keepBoth.
    Full,
    /// Adds missing items, always skips collisions. Used where other
    /// entities hold references to these IDs.
    AddMissing,
}

impl EntityKind {
    /// Every kind, in persistence order (referenced collections first).
    pub const ALL: [Self; 11] = [
        Self::Project,
        Self::Workflow,
        Self::WorktreeTemplate,
        Self::StepTemplate,
        Self::AiProvider,
        Self::PromptTemplate,
        Self::CliTool,
        Self::AutomationAction,
        Self::AutomationPermission,
        Self::DeploymentConfig,
        Self::ProjectAiSettings,
    ];

    /// Tag used in conflict items and overrides.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Workflow => "workflow",
            Self::WorktreeTemplate => "worktreeTemplate",
            Self::StepTemplate => "stepTemplate",
            Self::AiProvider => "aiProvider",
            Self::PromptTemplate => "promptTemplate",
            Self::CliTool => "cliTool",
            Self::AutomationAction => "automationAction",
            Self::AutomationPermission => "automationPermission",
            Self::DeploymentConfig => "deploymentConfig",
            Self::ProjectAiSettings => "projectAiSettings",
        }
    }

    /// Key of this collection inside the archive's `data` object.
    #[must_use]
    pub const fn collection_key(&self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::Workflow => "workflows",
            Self::WorktreeTemplate => "worktreeTemplates",
            Self::StepTemplate => "customStepTemplates",
            Self::AiProvider => "aiProviders",
            Self::PromptTemplate => "aiPromptTemplates",
            Self::CliTool => "cliToolConfigs",
            Self::AutomationAction => "automationActions",
            Self::AutomationPermission => "automationPermissions",
            Self::DeploymentConfig => "deploymentConfigs",
            Self::ProjectAiSettings => "projectAiSettings",
        }
    }

    /// JSON field holding the identifier.
    ///
    /// Per-project AI settings are keyed by the owning project.
    #[must_use]
    pub const fn id_field(&self) -> &'static str {
        match self {
            Self::ProjectAiSettings => "projectId",
            _ => "id",
        }
    }

    #[must_use]
    pub const fn merge_policy(&self) -> MergePolicy {
        match self {
            Self::Project | Self::Workflow | Self::WorktreeTemplate | Self::StepTemplate => {
                MergePolicy::Full
            }
            _ => MergePolicy::AddMissing,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    /// Accepts the tag (`worktreeTemplate`), the collection key
    /// (`worktreeTemplates`) or a kebab/snake spelling (`worktree-template`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.as_str().to_lowercase() == folded
                    || kind.collection_key().to_lowercase() == folded
            })
            .ok_or_else(|| format!("Unknown entity type: {s}"))
    }
}

/// A record uniquely addressed by an identifier within its collection.
///
/// The merge engine, conflict detector and replace executor are written
/// once against this trait and shared by every collection.
pub trait Identified:
    Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Human-readable label for conflict reports.
    fn display_name(&self) -> &str;

    /// Creation time in Unix milliseconds, if known and parseable.
    fn created_at(&self) -> Option<i64>;

    fn updated_at(&self) -> Option<i64>;

    /// Timestamp used when comparing two sides of a conflict.
    fn comparison_timestamp(&self) -> Option<i64> {
        self.updated_at().or_else(|| self.created_at())
    }
}

/// Records that belong to exactly one project.
pub trait ProjectOwned {
    fn project_id(&self) -> &str;
}

/// Implements [`Identified`] for entities with `id`, `name`, `created_at`
/// and `updated_at` fields.
macro_rules! impl_identified {
    ($ty:ty, $kind:expr) => {
        impl $crate::model::Identified for $ty {
            const KIND: $crate::model::EntityKind = $kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn display_name(&self) -> &str {
                self.name.as_deref().unwrap_or(&self.id)
            }

            fn created_at(&self) -> Option<i64> {
                self.created_at
                    .as_ref()
                    .and_then($crate::model::Timestamp::millis)
            }

            fn updated_at(&self) -> Option<i64> {
                self.updated_at
                    .as_ref()
                    .and_then($crate::model::Timestamp::millis)
            }
        }
    };
}

pub(crate) use impl_identified;

/// Invokes `$apply!(store_field, collection_field)` once per
/// identifier-bearing collection, in [`EntityKind::ALL`] order. The first
/// name is the [`Stores`](crate::store::Stores) field, the second the
/// [`CollectionSet`] field.
macro_rules! for_each_collection {
    ($apply:ident) => {
        $apply!(projects, projects);
        $apply!(workflows, workflows);
        $apply!(worktree_templates, worktree_templates);
        $apply!(step_templates, custom_step_templates);
        $apply!(ai_providers, ai_providers);
        $apply!(prompt_templates, ai_prompt_templates);
        $apply!(cli_tools, cli_tool_configs);
        $apply!(automation_actions, automation_actions);
        $apply!(automation_permissions, automation_permissions);
        $apply!(deployment_configs, deployment_configs);
        $apply!(project_ai_settings, project_ai_settings);
    };
}

pub(crate) use for_each_collection;
