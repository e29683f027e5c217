//! Integration records: AI providers, prompts, CLI tools, automation,
//! deploy accounts.
//!
//! Prompt templates reference provider IDs and automation permissions
//! reference action IDs, which is why these collections only ever gain
//! records on a merge.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntityKind, Timestamp, impl_identified};

/// A configured AI provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiProvider {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Provider family (e.g. "openai", "anthropic", "ollama")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,

    /// Reference into the OS keychain. Stripped on export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_identified!(AiProvider, EntityKind::AiProvider);

impl AiProvider {
    /// Remove credentials that must not leave this machine.
    pub fn sanitize(&mut self) {
        self.credential_ref = None;
    }
}

/// Reusable prompt bound to a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_identified!(PromptTemplate, EntityKind::PromptTemplate);

/// External CLI tool the app can launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliToolConfig {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_identified!(CliToolConfig, EntityKind::CliTool);

/// Action exposed by the automation server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationAction {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_identified!(AutomationAction, EntityKind::AutomationAction);

/// Grant allowing a client to run an automation action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationPermission {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_identified!(AutomationPermission, EntityKind::AutomationPermission);

/// Linked deployment account.
///
/// Exported for reference only (without its token) and never written back:
/// accounts have to be re-authenticated on the importing machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployAccount {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeployAccount {
    pub fn sanitize(&mut self) {
        self.token = None;
    }
}
