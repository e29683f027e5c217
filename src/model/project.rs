//! Project model and per-project records.
//!
//! Projects are the root of most cross-references: deployment configs and
//! AI settings point at a project ID, so both are fetched per project on
//! export.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntityKind, Identified, ProjectOwned, Timestamp, impl_identified};

/// A project (a local codebase the app manages).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier
    pub id: String,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Absolute path on the machine that exported it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Creation time (Unix milliseconds or RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,

    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,

    /// Fields not modelled here, carried through verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_identified!(Project, EntityKind::Project);

/// Deployment binding for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    pub id: String,

    pub project_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Deployment target (e.g. "vercel", "netlify")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Access token. Stripped on export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_identified!(DeploymentConfig, EntityKind::DeploymentConfig);

impl ProjectOwned for DeploymentConfig {
    fn project_id(&self) -> &str {
        &self.project_id
    }
}

impl DeploymentConfig {
    /// Remove credentials that must not leave this machine.
    pub fn sanitize(&mut self) {
        self.token = None;
    }
}

/// AI provider selection for one project, keyed by the project ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAiSettings {
    pub project_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identified for ProjectAiSettings {
    const KIND: EntityKind = EntityKind::ProjectAiSettings;

    fn id(&self) -> &str {
        &self.project_id
    }

    fn set_id(&mut self, id: String) {
        self.project_id = id;
    }

    fn display_name(&self) -> &str {
        &self.project_id
    }

    fn created_at(&self) -> Option<i64> {
        None
    }

    fn updated_at(&self) -> Option<i64> {
        self.updated_at.as_ref().and_then(Timestamp::millis)
    }
}

impl ProjectOwned for ProjectAiSettings {
    fn project_id(&self) -> &str {
        &self.project_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_id() {
        let named: Project =
            serde_json::from_value(serde_json::json!({"id": "p1", "name": "My Project"})).unwrap();
        let unnamed: Project = serde_json::from_value(serde_json::json!({"id": "p2"})).unwrap();

        assert_eq!(named.display_name(), "My Project");
        assert_eq!(unnamed.display_name(), "p2");
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = serde_json::json!({
            "id": "p1",
            "name": "Site",
            "color": "#ff0000",
            "pinned": true
        });
        let project: Project = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(project.extra.len(), 2);
        assert_eq!(serde_json::to_value(&project).unwrap(), json);
    }

    #[test]
    fn test_comparison_timestamp_falls_back_to_created() {
        let project: Project =
            serde_json::from_value(serde_json::json!({"id": "p1", "createdAt": 10})).unwrap();
        assert_eq!(project.comparison_timestamp(), Some(10));
    }

    #[test]
    fn test_string_timestamps_are_accepted() {
        let json = serde_json::json!({
            "id": "p1",
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-02T00:00:00Z"
        });
        let project: Project = serde_json::from_value(json.clone()).unwrap();

        assert_eq!(project.created_at(), Some(1_735_689_600_000));
        assert_eq!(project.comparison_timestamp(), Some(1_735_776_000_000));
        assert_eq!(serde_json::to_value(&project).unwrap(), json);
    }

    #[test]
    fn test_ai_settings_keyed_by_project() {
        let settings: ProjectAiSettings =
            serde_json::from_value(serde_json::json!({"projectId": "p1", "providerId": "openai"}))
                .unwrap();
        assert_eq!(settings.id(), "p1");
        assert_eq!(settings.project_id(), "p1");
    }

    #[test]
    fn test_deployment_sanitize_strips_token() {
        let mut config: DeploymentConfig = serde_json::from_value(serde_json::json!({
            "id": "d1", "projectId": "p1", "token": "secret"
        }))
        .unwrap();
        config.sanitize();
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("token").is_none());
    }
}
