//! Workflows and the templates they are built from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntityKind, Timestamp, impl_identified};

/// A workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,

    /// Connections between nodes, by node ID
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_identified!(Workflow, EntityKind::Workflow);

impl Workflow {
    /// Find a node by ID.
    #[must_use]
    pub fn node(&self, node_id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }
}

/// A single step in a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    pub id: String,

    /// Node type (e.g. "prompt", "shell", "approval")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    pub source: String,

    pub target: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Template for creating git worktrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorktreeTemplate {
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

impl_identified!(WorktreeTemplate, EntityKind::WorktreeTemplate);

/// User-defined workflow step template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTemplate {
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

impl_identified!(StepTemplate, EntityKind::StepTemplate);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Identified;

    #[test]
    fn test_workflow_parses_graph() {
        let workflow: Workflow = serde_json::from_value(serde_json::json!({
            "id": "wf1",
            "name": "Release",
            "nodes": [
                {"id": "n1", "type": "prompt", "label": "Plan", "x": 10},
                {"id": "n2", "type": "shell"}
            ],
            "edges": [{"source": "n1", "target": "n2"}],
            "createdAt": 5
        }))
        .unwrap();

        assert_eq!(workflow.nodes.len(), 2);
        assert_eq!(workflow.node("n1").unwrap().extra["x"], 10);
        assert_eq!(workflow.edges[0].target, "n2");
        assert_eq!(workflow.comparison_timestamp(), Some(5));
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let template: WorktreeTemplate =
            serde_json::from_value(serde_json::json!({"id": "wt1"})).unwrap();
        assert_eq!(template.display_name(), "wt1");
    }
}
