//! Destructive whole-collection substitution.

use crate::model::Identified;
use crate::store::{CollectionStore, Interrupted, StoreError};

/// What a replace did to one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub removed: usize,
    pub inserted: usize,
}

/// Delete every live item, then insert every archived item verbatim.
///
/// `None` (the collection is absent from the archive) still clears the
/// store. IDs are kept as archived.
///
/// # Errors
///
/// Returns the first store failure along with the deletes and inserts that
/// were committed before it. Those are not undone.
pub async fn replace_collection<T, S>(
    store: &S,
    archived: Option<&[T]>,
) -> Result<ReplaceOutcome, Interrupted<ReplaceOutcome>>
where
    T: Identified,
    S: CollectionStore<T> + ?Sized,
{
    let mut outcome = ReplaceOutcome::default();
    let stop = |committed: ReplaceOutcome, source: StoreError| Interrupted { committed, source };

    let live = store.list().await.map_err(|e| stop(outcome, e))?;
    for item in live {
        store.delete(item.id()).await.map_err(|e| stop(outcome, e))?;
        outcome.removed += 1;
    }

    for item in archived.unwrap_or_default() {
        store.save(item).await.map_err(|e| stop(outcome, e))?;
        outcome.inserted += 1;
    }

    tracing::debug!(
        kind = %T::KIND,
        removed = outcome.removed,
        inserted = outcome.inserted,
        "Replaced collection"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryCollection;
    use crate::model::Workflow;

    fn workflow(id: &str) -> Workflow {
        serde_json::from_value(serde_json::json!({"id": id})).unwrap()
    }

    #[tokio::test]
    async fn test_replace_substitutes_everything() {
        let store =
            MemoryCollection::with_items("workflows", vec![workflow("old1"), workflow("old2")]);
        let archived = vec![workflow("new1")];

        let outcome = replace_collection(&store, Some(archived.as_slice())).await.unwrap();

        assert_eq!(outcome, ReplaceOutcome { removed: 2, inserted: 1 });
        assert_eq!(store.items(), archived);
    }

    #[tokio::test]
    async fn test_absent_collection_clears_store() {
        let store = MemoryCollection::with_items("workflows", vec![workflow("old")]);

        let outcome = replace_collection::<Workflow, _>(&store, None).await.unwrap();

        assert_eq!(outcome.removed, 1);
        assert!(store.items().is_empty());
    }

    #[tokio::test]
    async fn test_failure_stops_midway() {
        let store = MemoryCollection::<Workflow>::new("workflows").failing_after(1);
        let archived = vec![workflow("a"), workflow("b")];

        let err = replace_collection(&store, Some(archived.as_slice())).await.unwrap_err();

        assert_eq!(err.source.collection(), "workflows");
        assert_eq!(err.committed, ReplaceOutcome { removed: 0, inserted: 1 });
        assert_eq!(store.items(), vec![workflow("a")]);
    }

    #[tokio::test]
    async fn test_failure_reports_deletes_already_done() {
        let store = MemoryCollection::with_items("workflows", vec![workflow("old1"), workflow("old2")])
            .failing_after(0);
        let archived = vec![workflow("new")];

        let err = replace_collection(&store, Some(archived.as_slice())).await.unwrap_err();

        assert_eq!(err.committed, ReplaceOutcome { removed: 2, inserted: 0 });
        assert!(store.items().is_empty());
    }
}
