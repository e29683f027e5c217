//! Types shared by the export and import passes.
//!
//! Strategy types describe what the caller wants done with colliding
//! identifiers; stats and summary types describe what was actually done.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{EntityKind, Metadata};

/// How an import applies the archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Reconcile per item, keeping everything not in the archive.
    #[default]
    Merge,
    /// Substitute every collection wholesale.
    Replace,
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => write!(f, "merge"),
            Self::Replace => write!(f, "replace"),
        }
    }
}

/// What to do with an archive item whose ID already exists locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictAction {
    /// Keep the local item.
    #[default]
    Skip,
    /// Replace the local item with the archived one.
    Overwrite,
    /// Keep both, giving the archived item a fresh ID.
    KeepBoth,
}

impl fmt::Display for ConflictAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Overwrite => write!(f, "overwrite"),
            Self::KeepBoth => write!(f, "keepBoth"),
        }
    }
}

impl FromStr for ConflictAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(Self::Skip),
            "overwrite" => Ok(Self::Overwrite),
            "keepBoth" | "keep-both" | "keep_both" => Ok(Self::KeepBoth),
            _ => Err(format!(
                "Unknown conflict action: {s} (expected skip, overwrite or keep-both)"
            )),
        }
    }
}

/// Per-item exception to the default action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOverride {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub action: ConflictAction,
}

impl FromStr for ItemOverride {
    type Err = String;

    /// Parses `TYPE:ID=ACTION`, e.g. `project:proj_1=overwrite`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, action) = s
            .rsplit_once('=')
            .ok_or_else(|| format!("Invalid override {s:?}: expected TYPE:ID=ACTION"))?;
        let (kind, id) = target
            .split_once(':')
            .ok_or_else(|| format!("Invalid override {s:?}: expected TYPE:ID=ACTION"))?;
        if id.is_empty() {
            return Err(format!("Invalid override {s:?}: empty ID"));
        }
        Ok(Self {
            id: id.to_string(),
            kind: kind.parse()?,
            action: action.parse()?,
        })
    }
}

/// Caller-chosen conflict resolution for one import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionStrategy {
    pub mode: ImportMode,
    pub default_action: ConflictAction,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item_overrides: Vec<ItemOverride>,
}

impl ResolutionStrategy {
    /// Merge mode with `default_action` for every collision.
    #[must_use]
    pub fn merge(default_action: ConflictAction) -> Self {
        Self {
            mode: ImportMode::Merge,
            default_action,
            item_overrides: Vec::new(),
        }
    }

    #[must_use]
    pub fn replace() -> Self {
        Self {
            mode: ImportMode::Replace,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_override(mut self, kind: EntityKind, id: impl Into<String>, action: ConflictAction) -> Self {
        self.item_overrides.push(ItemOverride {
            id: id.into(),
            kind,
            action,
        });
        self
    }

    /// The action for one item: a matching override, else the default.
    #[must_use]
    pub fn action_for(&self, kind: EntityKind, id: &str) -> ConflictAction {
        self.item_overrides
            .iter()
            .find(|o| o.kind == kind && o.id == id)
            .map_or(self.default_action, |o| o.action)
    }
}

/// Per-collection import counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStats {
    /// Items added (new IDs and keep-both copies).
    pub imported: usize,
    /// Colliding items left untouched.
    pub skipped: usize,
    /// Colliding items replaced in place.
    pub overwritten: usize,
    /// Live items deleted by a replace import.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub removed: usize,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl EntityStats {
    /// Archive items processed.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.imported + self.skipped + self.overwritten
    }
}

/// What an import actually applied.
///
/// Only collections that were fully persisted appear in `collections`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub collections: BTreeMap<EntityKind, EntityStats>,
    pub settings: bool,
    pub automation_server_config: bool,
    pub deploy_preferences: bool,
}

impl ImportSummary {
    /// Fold one collection's counts in.
    pub fn record(&mut self, kind: EntityKind, stats: EntityStats) {
        let entry = self.collections.entry(kind).or_default();
        entry.imported += stats.imported;
        entry.skipped += stats.skipped;
        entry.overwritten += stats.overwritten;
        entry.removed += stats.removed;
    }

    /// Counts for one collection (zero if it was not touched).
    #[must_use]
    pub fn stats(&self, kind: EntityKind) -> EntityStats {
        self.collections.get(&kind).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn total_imported(&self) -> usize {
        self.collections.values().map(|s| s.imported).sum()
    }

    #[must_use]
    pub fn total_skipped(&self) -> usize {
        self.collections.values().map(|s| s.skipped).sum()
    }

    #[must_use]
    pub fn total_overwritten(&self) -> usize {
        self.collections.values().map(|s| s.overwritten).sum()
    }

    #[must_use]
    pub fn total_removed(&self) -> usize {
        self.collections.values().map(|s| s.removed).sum()
    }
}

/// One identifier collision between the archive and live state.
///
/// Advisory only: produced by preview, never consulted by execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictItem {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub id: String,
    pub name: String,
    pub existing_updated_at: Option<i64>,
    pub importing_updated_at: Option<i64>,
    /// Both sides have the same content.
    pub identical: bool,
}

/// Result of a dry-run import.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub metadata: Metadata,
    /// Archive item counts per collection key, plus `1` for each singleton present.
    pub counts: BTreeMap<String, usize>,
    pub conflicts: Vec<ConflictItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_warning: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ImportPreview {
    /// Conflicts of one kind.
    pub fn conflicts_of(&self, kind: EntityKind) -> impl Iterator<Item = &ConflictItem> {
        self.conflicts.iter().filter(move |c| c.kind == kind)
    }
}

/// Statistics for an export.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStats {
    pub counts: BTreeMap<String, usize>,
    pub bytes: usize,
}

impl ExportStats {
    /// Total number of records exported.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
