//! Single-workflow and single-node share files.
//!
//! ```json
//! {"version": "1.1.0", "exportedAt": "...", "type": "workflow", "workflow": {...}}
//! {"version": "1.1.0", "exportedAt": "...", "type": "node", "node": {...}}
//! ```
//!
//! Importing a share never collides with local data: the workflow, and
//! every node in it, gets a fresh ID and edges are rewired to match.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result, catch_faults};
use crate::model::{Timestamp, Workflow, WorkflowNode};
use crate::store::Stores;
use crate::sync::file::{from_json, read_json, write_json};
use crate::version::{CURRENT_FORMAT_VERSION, check_compatibility};

/// A shared workflow or node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareFile {
    pub version: String,
    pub exported_at: String,
    #[serde(flatten)]
    pub item: SharedItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SharedItem {
    Workflow { workflow: Workflow },
    Node { node: WorkflowNode },
}

impl SharedItem {
    const fn label(&self) -> &'static str {
        match self {
            Self::Workflow { .. } => "workflow",
            Self::Node { .. } => "node",
        }
    }
}

impl ShareFile {
    fn new(item: SharedItem) -> Self {
        Self {
            version: CURRENT_FORMAT_VERSION.to_string(),
            exported_at: Utc::now().to_rfc3339(),
            item,
        }
    }

    #[must_use]
    pub fn workflow(workflow: &Workflow) -> Self {
        Self::new(SharedItem::Workflow {
            workflow: workflow.clone(),
        })
    }

    #[must_use]
    pub fn node(node: &WorkflowNode) -> Self {
        Self::new(SharedItem::Node { node: node.clone() })
    }
}

/// Read a share file and check its version.
///
/// # Errors
///
/// [`Error::Read`] if unreadable, [`Error::InvalidFormat`] if not a share
/// file or its version is unsupported.
pub async fn read_share(path: &Path) -> Result<ShareFile> {
    let share: ShareFile = from_json(read_json(path).await?)?;
    check_compatibility(&share.version).map_err(|e| Error::InvalidFormat(e.to_string()))?;
    Ok(share)
}

/// A copy of `workflow` that cannot collide with anything local.
///
/// The workflow ID, timestamps and every node ID are regenerated; edges are
/// rewired to the new node IDs. Edges naming unknown nodes are kept as is.
#[must_use]
pub fn adopt_workflow(workflow: &Workflow) -> Workflow {
    let now = Timestamp::now();
    let mut adopted = workflow.clone();
    adopted.id = Uuid::new_v4().to_string();
    adopted.created_at = Some(now.clone());
    adopted.updated_at = Some(now);

    let mut renamed = HashMap::new();
    for node in &mut adopted.nodes {
        let fresh = Uuid::new_v4().to_string();
        renamed.insert(std::mem::replace(&mut node.id, fresh.clone()), fresh);
    }
    for edge in &mut adopted.edges {
        if let Some(id) = renamed.get(&edge.source) {
            edge.source.clone_from(id);
        }
        if let Some(id) = renamed.get(&edge.target) {
            edge.target.clone_from(id);
        }
    }
    adopted
}

/// A copy of `node` under a fresh ID.
#[must_use]
pub fn adopt_node(node: &WorkflowNode) -> WorkflowNode {
    let mut adopted = node.clone();
    adopted.id = Uuid::new_v4().to_string();
    adopted
}

/// Write workflow `workflow_id` to a share file.
///
/// # Errors
///
/// [`Error::NotFound`] if no such workflow, [`Error::Export`] on store
/// failure, [`Error::Write`] if the file cannot be written.
pub async fn export_workflow(stores: &Stores, workflow_id: &str, path: &Path) -> Result<()> {
    catch_faults(
        async {
            let workflow = find_workflow(stores, workflow_id, Error::Export).await?;
            write_json(path, &ShareFile::workflow(&workflow)).await?;
            info!(workflow = workflow_id, path = %path.display(), "Workflow shared");
            Ok::<_, Error>(())
        },
        Error::Export,
    )
    .await
}

/// Write one node of workflow `workflow_id` to a share file.
///
/// # Errors
///
/// [`Error::NotFound`] if the workflow or node does not exist, otherwise as
/// [`export_workflow`].
pub async fn export_node(stores: &Stores, workflow_id: &str, node_id: &str, path: &Path) -> Result<()> {
    catch_faults(
        async {
            let workflow = find_workflow(stores, workflow_id, Error::Export).await?;
            let node = workflow.node(node_id).ok_or_else(|| Error::NotFound {
                kind: "Node".to_string(),
                id: node_id.to_string(),
            })?;
            write_json(path, &ShareFile::node(node)).await?;
            info!(workflow = workflow_id, node = node_id, path = %path.display(), "Node shared");
            Ok::<_, Error>(())
        },
        Error::Export,
    )
    .await
}

/// Import a shared workflow as a new workflow.
///
/// # Errors
///
/// [`Error::InvalidFormat`] if the file is not a workflow share,
/// [`Error::Import`] on store failure.
pub async fn import_workflow(stores: &Stores, path: &Path) -> Result<Workflow> {
    catch_faults(
        async {
            let share = read_share(path).await?;
            let workflow = match share.item {
                SharedItem::Workflow { workflow } => workflow,
                other => return Err(wrong_kind("workflow", &other)),
            };

            let adopted = adopt_workflow(&workflow);
            stores
                .workflows
                .save(&adopted)
                .await
                .map_err(|e| Error::Import(e.to_string()))?;
            info!(workflow = %adopted.id, nodes = adopted.nodes.len(), "Workflow imported");
            Ok(adopted)
        },
        Error::Import,
    )
    .await
}

/// Append a shared node to workflow `workflow_id`.
///
/// # Errors
///
/// [`Error::NotFound`] if the target workflow does not exist,
/// [`Error::InvalidFormat`] if the file is not a node share,
/// [`Error::Import`] on store failure.
pub async fn import_node(stores: &Stores, path: &Path, workflow_id: &str) -> Result<WorkflowNode> {
    catch_faults(
        async {
            let share = read_share(path).await?;
            let node = match share.item {
                SharedItem::Node { node } => node,
                other => return Err(wrong_kind("node", &other)),
            };

            let mut workflow = find_workflow(stores, workflow_id, Error::Import).await?;
            let adopted = adopt_node(&node);
            workflow.nodes.push(adopted.clone());
            workflow.updated_at = Some(Timestamp::now());
            stores
                .workflows
                .save(&workflow)
                .await
                .map_err(|e| Error::Import(e.to_string()))?;
            info!(workflow = workflow_id, node = %adopted.id, "Node imported");
            Ok(adopted)
        },
        Error::Import,
    )
    .await
}

async fn find_workflow(stores: &Stores, workflow_id: &str, wrap: fn(String) -> Error) -> Result<Workflow> {
    stores
        .workflows
        .list()
        .await
        .map_err(|e| wrap(e.to_string()))?
        .into_iter()
        .find(|w| w.id == workflow_id)
        .ok_or_else(|| Error::NotFound {
            kind: "Workflow".to_string(),
            id: workflow_id.to_string(),
        })
}

fn wrong_kind(expected: &str, found: &SharedItem) -> Error {
    Error::InvalidFormat(format!(
        "expected a {expected} share file, found a {} share file",
        found.label()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryCollection;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sample_workflow() -> Workflow {
        serde_json::from_value(serde_json::json!({
            "id": "wf1",
            "name": "Release",
            "createdAt": 1000,
            "updatedAt": 2000,
            "nodes": [
                {"id": "n1", "type": "prompt", "label": "Plan"},
                {"id": "n2", "type": "shell", "label": "Build"},
                {"id": "n3", "type": "approval"}
            ],
            "edges": [
                {"source": "n1", "target": "n2"},
                {"source": "n2", "target": "n3", "condition": "ok"}
            ],
            "tags": ["ci"]
        }))
        .unwrap()
    }

    fn stores_with(workflow: Workflow) -> (Stores, Arc<MemoryCollection<Workflow>>) {
        let workflows = Arc::new(MemoryCollection::with_items("workflows", vec![workflow]));
        let mut stores = Stores::in_memory();
        stores.workflows = workflows.clone();
        (stores, workflows)
    }

    #[test]
    fn test_share_file_wire_format() {
        let share = ShareFile::workflow(&sample_workflow());
        let json = serde_json::to_value(&share).unwrap();

        assert_eq!(json["type"], "workflow");
        assert_eq!(json["version"], CURRENT_FORMAT_VERSION);
        assert!(json["exportedAt"].is_string());
        assert_eq!(json["workflow"]["id"], "wf1");

        let node = ShareFile::node(&sample_workflow().nodes[0]);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "node");
        assert_eq!(json["node"]["label"], "Plan");
    }

    #[test]
    fn test_adopt_workflow_regenerates_identity() {
        let original = sample_workflow();
        let adopted = adopt_workflow(&original);

        assert_ne!(adopted.id, original.id);
        assert_ne!(adopted.created_at, original.created_at);
        assert_ne!(adopted.updated_at, original.updated_at);

        let old_ids: HashSet<_> = original.nodes.iter().map(|n| n.id.as_str()).collect();
        let new_ids: HashSet<_> = adopted.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(new_ids.len(), original.nodes.len());
        assert!(old_ids.is_disjoint(&new_ids));

        // Edges follow the renamed nodes
        assert_eq!(adopted.edges[0].source, adopted.nodes[0].id);
        assert_eq!(adopted.edges[0].target, adopted.nodes[1].id);
        assert_eq!(adopted.edges[1].target, adopted.nodes[2].id);
    }

    #[tokio::test]
    async fn test_round_trip_preserves_everything_else() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wf.json");
        let original = sample_workflow();
        let (stores, workflows) = stores_with(original.clone());

        export_workflow(&stores, "wf1", &path).await.unwrap();
        let imported = import_workflow(&stores, &path).await.unwrap();

        assert_eq!(workflows.items().len(), 2);

        // Normalize the regenerated fields and compare the rest
        let mut normalized = imported.clone();
        normalized.id = original.id.clone();
        normalized.created_at.clone_from(&original.created_at);
        normalized.updated_at.clone_from(&original.updated_at);
        let renamed: HashMap<_, _> = imported
            .nodes
            .iter()
            .zip(&original.nodes)
            .map(|(new, old)| (new.id.clone(), old.id.clone()))
            .collect();
        for node in &mut normalized.nodes {
            node.id = renamed[&node.id].clone();
        }
        for edge in &mut normalized.edges {
            edge.source = renamed[&edge.source].clone();
            edge.target = renamed[&edge.target].clone();
        }
        assert_eq!(normalized, original);
    }

    #[tokio::test]
    async fn test_node_appended_to_target_workflow() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("node.json");
        let (stores, workflows) = stores_with(sample_workflow());

        export_node(&stores, "wf1", "n2", &path).await.unwrap();
        let node = import_node(&stores, &path, "wf1").await.unwrap();

        let workflow = &workflows.items()[0];
        assert_eq!(workflow.nodes.len(), 4);
        assert_eq!(workflow.nodes[3], node);
        assert_ne!(node.id, "n2");
        assert_eq!(node.label.as_deref(), Some("Build"));
    }

    #[tokio::test]
    async fn test_missing_workflow_and_node() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.json");
        let (stores, _) = stores_with(sample_workflow());

        let err = export_workflow(&stores, "nope", &path).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        let err = export_node(&stores, "wf1", "nope", &path).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_wrong_share_kind_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("node.json");
        let (stores, workflows) = stores_with(sample_workflow());

        export_node(&stores, "wf1", "n1", &path).await.unwrap();
        let err = import_workflow(&stores, &path).await.unwrap_err();

        assert!(matches!(err, Error::InvalidFormat(_)));
        assert_eq!(workflows.items().len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_share_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("old.json");
        let mut share = ShareFile::workflow(&sample_workflow());
        share.version = "0.2.0".into();
        std::fs::write(&path, serde_json::to_string(&share).unwrap()).unwrap();

        let err = read_share(&path).await.unwrap_err();
        assert!(err.to_string().contains("older than"));
    }
}
