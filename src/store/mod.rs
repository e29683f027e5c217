//! Store collaborators.
//!
//! Each entity collection is owned by a store that can list, save (upsert by
//! ID) and delete whole entities. The reconciliation engine only talks to
//! these traits, so it runs the same against the file-backed stores used by
//! the binary and the in-memory fakes used in tests.
//!
//! # Submodules
//!
//! - [`json`] - One JSON file per collection in a data directory
//! - [`memory`] - In-memory stores with write counters and failure injection

pub mod json;
pub mod memory;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::model::{
    AiProvider, AutomationAction, AutomationPermission, AutomationServerConfig, CliToolConfig,
    CollectionSet, DeployAccount, DeployPreferences, DeploymentConfig, Identified, Project,
    ProjectAiSettings, ProjectOwned, PromptTemplate, Settings, StepTemplate, Workflow,
    WorktreeTemplate,
};

/// Store failures, tagged with the collection they happened in.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{collection}: I/O error: {source}")]
    Io {
        collection: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{collection}: malformed data: {source}")]
    Malformed {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{collection}: {message}")]
    Unavailable { collection: String, message: String },
}

impl StoreError {
    /// Collection the failure happened in.
    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            Self::Io { collection, .. }
            | Self::Malformed { collection, .. }
            | Self::Unavailable { collection, .. } => collection,
        }
    }
}

/// A store failure partway through a multi-write operation, together with
/// what was committed before it.
#[derive(Debug)]
pub struct Interrupted<O> {
    pub committed: O,
    pub source: StoreError,
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A collection of identifier-bearing entities.
///
/// Implementations read the whole collection, mutate it and write it back,
/// so callers must not issue concurrent writes to the same store.
#[async_trait]
pub trait CollectionStore<T: Identified>: Send + Sync {
    /// Every entity currently stored.
    async fn list(&self) -> StoreResult<Vec<T>>;

    /// Insert or replace the entity with the same ID.
    async fn save(&self, item: &T) -> StoreResult<()>;

    /// Remove the entity with `id`. Removing a missing ID is not an error.
    async fn delete(&self, id: &str) -> StoreResult<()>;
}

/// A collection whose records belong to one project each.
///
/// Lookups are issued one project at a time: the backing stores assume a
/// single reader, so callers must not fan these out concurrently.
#[async_trait]
pub trait ProjectScopedStore<T: Identified + ProjectOwned>: CollectionStore<T> {
    /// The record for `project_id`, or `None` if that project has none.
    async fn load_for_project(&self, project_id: &str) -> StoreResult<Option<T>>;
}

/// A single configuration object.
#[async_trait]
pub trait SingletonStore<T: Send + Sync + 'static>: Send + Sync {
    async fn load(&self) -> StoreResult<Option<T>>;

    async fn save(&self, value: &T) -> StoreResult<()>;
}

/// Linked deployment accounts. Read-only: imports never write accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<DeployAccount>>;
}

/// One store per collection.
#[derive(Clone)]
pub struct Stores {
    pub projects: Arc<dyn CollectionStore<Project>>,
    pub workflows: Arc<dyn CollectionStore<Workflow>>,
    pub worktree_templates: Arc<dyn CollectionStore<WorktreeTemplate>>,
    pub step_templates: Arc<dyn CollectionStore<StepTemplate>>,
    pub ai_providers: Arc<dyn CollectionStore<AiProvider>>,
    pub prompt_templates: Arc<dyn CollectionStore<PromptTemplate>>,
    pub cli_tools: Arc<dyn CollectionStore<CliToolConfig>>,
    pub automation_actions: Arc<dyn CollectionStore<AutomationAction>>,
    pub automation_permissions: Arc<dyn CollectionStore<AutomationPermission>>,
    pub deployment_configs: Arc<dyn ProjectScopedStore<DeploymentConfig>>,
    pub project_ai_settings: Arc<dyn ProjectScopedStore<ProjectAiSettings>>,
    pub settings: Arc<dyn SingletonStore<Settings>>,
    pub automation_server: Arc<dyn SingletonStore<AutomationServerConfig>>,
    pub deploy_preferences: Arc<dyn SingletonStore<DeployPreferences>>,
    /// Read-only: accounts are exported for reference and never written.
    pub deploy_accounts: Arc<dyn AccountStore>,
}

impl Stores {
    /// File-backed stores under `dir`, one JSON file per collection.
    #[must_use]
    pub fn open_dir(dir: &Path) -> Self {
        use json::{JsonCollectionStore as C, JsonSingletonStore as S};

        debug!(dir = %dir.display(), "Opening JSON stores");
        Self {
            projects: Arc::new(C::<Project>::new(dir, "projects")),
            workflows: Arc::new(C::<Workflow>::new(dir, "workflows")),
            worktree_templates: Arc::new(C::<WorktreeTemplate>::new(dir, "worktreeTemplates")),
            step_templates: Arc::new(C::<StepTemplate>::new(dir, "customStepTemplates")),
            ai_providers: Arc::new(C::<AiProvider>::new(dir, "aiProviders")),
            prompt_templates: Arc::new(C::<PromptTemplate>::new(dir, "aiPromptTemplates")),
            cli_tools: Arc::new(C::<CliToolConfig>::new(dir, "cliToolConfigs")),
            automation_actions: Arc::new(C::<AutomationAction>::new(dir, "automationActions")),
            automation_permissions: Arc::new(C::<AutomationPermission>::new(dir, "automationPermissions")),
            deployment_configs: Arc::new(C::<DeploymentConfig>::new(dir, "deploymentConfigs")),
            project_ai_settings: Arc::new(C::<ProjectAiSettings>::new(dir, "projectAiSettings")),
            settings: Arc::new(S::<Settings>::new(dir, "settings")),
            automation_server: Arc::new(S::<AutomationServerConfig>::new(dir, "automationServerConfig")),
            deploy_preferences: Arc::new(S::<DeployPreferences>::new(dir, "deployPreferences")),
            deploy_accounts: Arc::new(json::JsonAccountStore::new(dir)),
        }
    }

    /// Empty in-memory stores.
    #[must_use]
    pub fn in_memory() -> Self {
        use memory::{MemoryCollection as C, MemorySingleton as S};

        Self {
            projects: Arc::new(C::<Project>::new("projects")),
            workflows: Arc::new(C::<Workflow>::new("workflows")),
            worktree_templates: Arc::new(C::<WorktreeTemplate>::new("worktreeTemplates")),
            step_templates: Arc::new(C::<StepTemplate>::new("customStepTemplates")),
            ai_providers: Arc::new(C::<AiProvider>::new("aiProviders")),
            prompt_templates: Arc::new(C::<PromptTemplate>::new("aiPromptTemplates")),
            cli_tools: Arc::new(C::<CliToolConfig>::new("cliToolConfigs")),
            automation_actions: Arc::new(C::<AutomationAction>::new("automationActions")),
            automation_permissions: Arc::new(C::<AutomationPermission>::new("automationPermissions")),
            deployment_configs: Arc::new(C::<DeploymentConfig>::new("deploymentConfigs")),
            project_ai_settings: Arc::new(C::<ProjectAiSettings>::new("projectAiSettings")),
            settings: Arc::new(S::<Settings>::new("settings")),
            automation_server: Arc::new(S::<AutomationServerConfig>::new("automationServerConfig")),
            deploy_preferences: Arc::new(S::<DeployPreferences>::new("deployPreferences")),
            deploy_accounts: Arc::new(memory::MemoryAccounts::default()),
        }
    }

    /// Read the live state of every collection.
    ///
    /// Top-level collections are fetched concurrently (they live in disjoint
    /// stores). Per-project records are then looked up one project at a
    /// time; a project without a record is skipped.
    ///
    /// # Errors
    ///
    /// Returns the first store failure.
    pub async fn snapshot(&self) -> StoreResult<CollectionSet> {
        let (
            projects,
            workflows,
            worktree_templates,
            custom_step_templates,
            ai_providers,
            ai_prompt_templates,
            cli_tool_configs,
            automation_actions,
            automation_permissions,
            deploy_accounts,
            settings,
            automation_server_config,
            deploy_preferences,
        ) = tokio::try_join!(
            self.projects.list(),
            self.workflows.list(),
            self.worktree_templates.list(),
            self.step_templates.list(),
            self.ai_providers.list(),
            self.prompt_templates.list(),
            self.cli_tools.list(),
            self.automation_actions.list(),
            self.automation_permissions.list(),
            self.deploy_accounts.list(),
            self.settings.load(),
            self.automation_server.load(),
            self.deploy_preferences.load(),
        )?;

        let project_ai_settings =
            collect_per_project(&*self.project_ai_settings, &projects).await?;
        let deployment_configs = collect_per_project(&*self.deployment_configs, &projects).await?;

        debug!(
            projects = projects.len(),
            workflows = workflows.len(),
            deployment_configs = deployment_configs.len(),
            "Live snapshot loaded"
        );

        Ok(CollectionSet {
            projects: Some(projects),
            workflows: Some(workflows),
            worktree_templates: Some(worktree_templates),
            custom_step_templates: Some(custom_step_templates),
            ai_providers: Some(ai_providers),
            ai_prompt_templates: Some(ai_prompt_templates),
            cli_tool_configs: Some(cli_tool_configs),
            automation_actions: Some(automation_actions),
            automation_permissions: Some(automation_permissions),
            deployment_configs: Some(deployment_configs),
            project_ai_settings: Some(project_ai_settings),
            settings,
            automation_server_config,
            deploy_preferences,
            deploy_accounts: Some(deploy_accounts),
        })
    }
}

async fn collect_per_project<T, S>(store: &S, projects: &[Project]) -> StoreResult<Vec<T>>
where
    T: Identified + ProjectOwned,
    S: ProjectScopedStore<T> + ?Sized,
{
    let mut records = Vec::new();
    for project in projects {
        match store.load_for_project(&project.id).await? {
            Some(record) => records.push(record),
            None => debug!(project = %project.id, kind = %T::KIND, "No per-project record"),
        }
    }
    Ok(records)
}
