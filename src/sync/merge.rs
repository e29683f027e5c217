//! Per-collection reconciliation.
//!
//! Pure functions over slices: they compute the merged collection and the
//! counts, and never touch a store. Persisting the result is the import
//! orchestrator's job.

use std::collections::HashMap;

use uuid::Uuid;

use crate::model::Identified;
use crate::sync::types::{ConflictAction, EntityStats, ResolutionStrategy};

/// A merged collection and how it was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome<T> {
    pub merged: Vec<T>,
    pub imported: usize,
    pub skipped: usize,
    pub overwritten: usize,
}

impl<T> MergeOutcome<T> {
    #[must_use]
    pub const fn stats(&self) -> EntityStats {
        EntityStats {
            imported: self.imported,
            skipped: self.skipped,
            overwritten: self.overwritten,
            removed: 0,
        }
    }
}

/// Reconcile `archive` into `live` honoring skip / overwrite / keepBoth.
///
/// `merged` starts as a copy of `live`. An archive item with an unused ID is
/// appended whatever the action. On a collision the per-item override (or
/// the default action) decides. IDs in `merged` stay unique, including when
/// the archive itself repeats an ID.
#[must_use]
pub fn merge_collection<T: Identified>(
    archive: &[T],
    live: &[T],
    strategy: &ResolutionStrategy,
) -> MergeOutcome<T> {
    let mut outcome = MergeOutcome {
        merged: live.to_vec(),
        imported: 0,
        skipped: 0,
        overwritten: 0,
    };
    let mut index: HashMap<String, usize> = outcome
        .merged
        .iter()
        .enumerate()
        .map(|(pos, item)| (item.id().to_string(), pos))
        .collect();

    for incoming in archive {
        let Some(&pos) = index.get(incoming.id()) else {
            index.insert(incoming.id().to_string(), outcome.merged.len());
            outcome.merged.push(incoming.clone());
            outcome.imported += 1;
            continue;
        };

        match strategy.action_for(T::KIND, incoming.id()) {
            ConflictAction::Skip => outcome.skipped += 1,
            ConflictAction::Overwrite => {
                outcome.merged[pos] = incoming.clone();
                outcome.overwritten += 1;
            }
            ConflictAction::KeepBoth => {
                let id = fresh_id(|candidate| index.contains_key(candidate));
                let mut copy = incoming.clone();
                copy.set_id(id.clone());
                index.insert(id, outcome.merged.len());
                outcome.merged.push(copy);
                outcome.imported += 1;
            }
        }
    }

    tracing::trace!(
        kind = %T::KIND,
        imported = outcome.imported,
        skipped = outcome.skipped,
        overwritten = outcome.overwritten,
        "Merged collection"
    );
    outcome
}

/// Add archive items whose ID is unused; skip every collision.
///
/// For collections other entities reference by ID, where overwriting or
/// re-identifying an item could leave dangling references.
#[must_use]
pub fn merge_missing_only<T: Identified>(archive: &[T], live: &[T]) -> MergeOutcome<T> {
    let mut outcome = MergeOutcome {
        merged: live.to_vec(),
        imported: 0,
        skipped: 0,
        overwritten: 0,
    };
    let mut seen: std::collections::HashSet<String> =
        live.iter().map(|item| item.id().to_string()).collect();

    for incoming in archive {
        if seen.insert(incoming.id().to_string()) {
            outcome.merged.push(incoming.clone());
            outcome.imported += 1;
        } else {
            outcome.skipped += 1;
        }
    }
    outcome
}

/// A random ID not rejected by `taken`.
fn fresh_id(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let candidate = Uuid::new_v4().to_string();
        if !taken(&candidate) {
            return candidate;
        }
    }
}
