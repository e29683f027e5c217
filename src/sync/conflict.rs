//! Identifier collision analysis.
//!
//! Read-only: compares an archive's collections against live state and
//! reports every archive item whose ID already exists locally. Linear in the
//! total number of items.

use std::collections::HashMap;

use crate::model::{CollectionSet, Identified, for_each_collection};
use crate::sync::hash::same_content;
use crate::sync::types::ConflictItem;

/// Every collision across all identifier-bearing collections.
///
/// Collections absent on either side produce no conflicts.
#[must_use]
pub fn detect_conflicts(archive: &CollectionSet, live: &CollectionSet) -> Vec<ConflictItem> {
    let mut conflicts = Vec::new();

    macro_rules! collect_from {
        ($_store:ident, $field:ident) => {
            collect(&mut conflicts, archive.$field.as_deref(), live.$field.as_deref());
        };
    }
    for_each_collection!(collect_from);

    tracing::debug!(count = conflicts.len(), "Conflict detection complete");
    conflicts
}

fn collect<T: Identified>(out: &mut Vec<ConflictItem>, archive: Option<&[T]>, live: Option<&[T]>) {
    let (Some(archive), Some(live)) = (archive, live) else {
        return;
    };
    out.extend(detect_in_collection(archive, live));
}

/// Collisions within one collection.
pub fn detect_in_collection<T: Identified>(archive: &[T], live: &[T]) -> Vec<ConflictItem> {
    let by_id: HashMap<&str, &T> = live.iter().map(|item| (item.id(), item)).collect();

    archive
        .iter()
        .filter_map(|incoming| {
            let existing = by_id.get(incoming.id())?;
            Some(ConflictItem {
                kind: T::KIND,
                id: incoming.id().to_string(),
                name: incoming.display_name().to_string(),
                existing_updated_at: existing.comparison_timestamp(),
                importing_updated_at: incoming.comparison_timestamp(),
                identical: same_content(*existing, incoming),
            })
        })
        .collect()
}
