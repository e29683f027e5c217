//! The archive envelope.
//!
//! ```json
//! {
//!   "metadata": {"version": "1.1.0", "appVersion": "0.1.0", "exportedAt": "...", "exportType": "full"},
//!   "data": {"projects": [...], "workflows": [...], "settings": {...}}
//! }
//! ```
//!
//! Every collection in `data` is optional. For imports the difference
//! between an absent key and an empty array matters: merge skips absent
//! collections, replace clears them.

use serde::{Deserialize, Serialize};

use super::{
    AiProvider, AutomationAction, AutomationPermission, AutomationServerConfig, CliToolConfig,
    DeployAccount, DeployPreferences, DeploymentConfig, EntityKind, Project, ProjectAiSettings,
    PromptTemplate, Settings, StepTemplate, Workflow, WorktreeTemplate,
};

/// Root unit of export and import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    pub metadata: Metadata,
    pub data: CollectionSet,
}

/// Archive header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Archive format version (`major.minor.patch`)
    pub version: String,
    /// Version of the application that wrote the archive
    #[serde(default)]
    pub app_version: String,
    /// RFC 3339 export timestamp
    pub exported_at: String,
    pub export_type: ExportType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    Full,
    Partial,
}

/// Every collection an archive can carry.
///
/// Also used as the in-memory snapshot of live state, in which case every
/// field is populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<Project>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflows: Option<Vec<Workflow>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_templates: Option<Vec<WorktreeTemplate>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_step_templates: Option<Vec<StepTemplate>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_providers: Option<Vec<AiProvider>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_prompt_templates: Option<Vec<PromptTemplate>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_tool_configs: Option<Vec<CliToolConfig>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automation_actions: Option<Vec<AutomationAction>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automation_permissions: Option<Vec<AutomationPermission>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_configs: Option<Vec<DeploymentConfig>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_ai_settings: Option<Vec<ProjectAiSettings>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automation_server_config: Option<AutomationServerConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_preferences: Option<DeployPreferences>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_accounts: Option<Vec<DeployAccount>>,
}

impl CollectionSet {
    /// Number of items in an identifier-bearing collection, `None` if absent.
    #[must_use]
    pub fn count(&self, kind: EntityKind) -> Option<usize> {
        match kind {
            EntityKind::Project => self.projects.as_ref().map(Vec::len),
            EntityKind::Workflow => self.workflows.as_ref().map(Vec::len),
            EntityKind::WorktreeTemplate => self.worktree_templates.as_ref().map(Vec::len),
            EntityKind::StepTemplate => self.custom_step_templates.as_ref().map(Vec::len),
            EntityKind::AiProvider => self.ai_providers.as_ref().map(Vec::len),
            EntityKind::PromptTemplate => self.ai_prompt_templates.as_ref().map(Vec::len),
            EntityKind::CliTool => self.cli_tool_configs.as_ref().map(Vec::len),
            EntityKind::AutomationAction => self.automation_actions.as_ref().map(Vec::len),
            EntityKind::AutomationPermission => {
                self.automation_permissions.as_ref().map(Vec::len)
            }
            EntityKind::DeploymentConfig => self.deployment_configs.as_ref().map(Vec::len),
            EntityKind::ProjectAiSettings => self.project_ai_settings.as_ref().map(Vec::len),
        }
    }

    /// Strip every field that must never leave the local machine.
    pub fn sanitize(&mut self) {
        for provider in self.ai_providers.iter_mut().flatten() {
            provider.sanitize();
        }
        for config in self.deployment_configs.iter_mut().flatten() {
            config.sanitize();
        }
        for account in self.deploy_accounts.iter_mut().flatten() {
            account.sanitize();
        }
    }
}
