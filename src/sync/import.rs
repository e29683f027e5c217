//! Archive import.
//!
//! Preview and execute are independent: each reads and validates the file
//! itself, so a file changed between the two is caught by execute.
//!
//! # Persistence
//!
//! Collections are written one at a time in [`EntityKind::ALL`] order. A
//! store failure stops the import at that collection without rolling back
//! anything already written; the error carries a summary of exactly what
//! was committed, including the part of the failing collection that went
//! through.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result, catch_faults};
use crate::model::{Archive, CollectionSet, EntityKind, Identified, MergePolicy, for_each_collection};
use crate::store::{CollectionStore, Interrupted, SingletonStore, StoreError, Stores};
use crate::sync::conflict::detect_conflicts;
use crate::sync::export::collection_counts;
use crate::sync::file::{from_json, read_json};
use crate::sync::merge::{merge_collection, merge_missing_only};
use crate::sync::replace::{ReplaceOutcome, replace_collection};
use crate::sync::types::{EntityStats, ImportMode, ImportPreview, ImportSummary, ResolutionStrategy};
use crate::validate::{ValidationReport, validate_archive};
use crate::version::check_compatibility;

/// Reconciles archives against the stores.
#[derive(Clone)]
pub struct Importer {
    stores: Stores,
}

impl Importer {
    #[must_use]
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Validate an archive and report what importing it would collide with.
    ///
    /// Never writes.
    ///
    /// # Errors
    ///
    /// - [`Error::Read`] if the file cannot be read
    /// - [`Error::InvalidFormat`] if it is not JSON
    /// - [`Error::Validation`] with every violation if it is not a valid archive
    /// - [`Error::Import`] if a store read fails
    pub async fn preview(&self, path: &Path) -> Result<ImportPreview> {
        catch_faults(self.preview_inner(path), Error::Import).await
    }

    async fn preview_inner(&self, path: &Path) -> Result<ImportPreview> {
        let (archive, report) = load_archive(path).await?;

        let live = self
            .stores
            .snapshot()
            .await
            .map_err(|e| Error::Import(e.to_string()))?;
        let conflicts = detect_conflicts(&archive.data, &live);

        let version_warning = check_compatibility(&archive.metadata.version)
            .ok()
            .and_then(|c| c.warning());

        info!(
            path = %path.display(),
            conflicts = conflicts.len(),
            "Preview complete"
        );

        Ok(ImportPreview {
            counts: collection_counts(&archive.data),
            metadata: archive.metadata,
            conflicts,
            version_warning,
            warnings: report.warnings,
        })
    }

    /// Apply an archive with `strategy`.
    ///
    /// # Errors
    ///
    /// Everything [`Importer::preview`] can return, plus
    /// [`Error::PartialImport`] if a store write fails partway.
    pub async fn execute(&self, path: &Path, strategy: &ResolutionStrategy) -> Result<ImportSummary> {
        catch_faults(self.execute_inner(path, strategy), Error::Import).await
    }

    async fn execute_inner(&self, path: &Path, strategy: &ResolutionStrategy) -> Result<ImportSummary> {
        let (archive, _) = load_archive(path).await?;
        info!(path = %path.display(), mode = %strategy.mode, "Import started");

        let summary = match strategy.mode {
            ImportMode::Merge => self.merge_all(&archive.data, strategy).await?,
            ImportMode::Replace => self.replace_all(&archive.data).await?,
        };

        info!(
            imported = summary.total_imported(),
            skipped = summary.total_skipped(),
            overwritten = summary.total_overwritten(),
            removed = summary.total_removed(),
            "Import complete"
        );
        Ok(summary)
    }

    async fn merge_all(&self, data: &CollectionSet, strategy: &ResolutionStrategy) -> Result<ImportSummary> {
        let stores = &self.stores;
        let mut summary = ImportSummary::default();

        macro_rules! merge_step {
            ($store:ident, $field:ident) => {
                merge_into(&*stores.$store, data.$field.as_deref(), strategy, &mut summary).await?;
            };
        }
        for_each_collection!(merge_step);

        self.write_singletons(data, &mut summary).await?;
        Ok(summary)
    }

    async fn replace_all(&self, data: &CollectionSet) -> Result<ImportSummary> {
        let stores = &self.stores;
        let mut summary = ImportSummary::default();

        macro_rules! replace_step {
            ($store:ident, $field:ident) => {
                replace_into(&*stores.$store, data.$field.as_deref(), &mut summary).await?;
            };
        }
        for_each_collection!(replace_step);

        self.write_singletons(data, &mut summary).await?;
        Ok(summary)
    }

    /// Overwrite every singleton present in the archive. Absent ones are left alone.
    async fn write_singletons(&self, data: &CollectionSet, summary: &mut ImportSummary) -> Result<()> {
        let s = &self.stores;
        summary.settings = write_singleton(&*s.settings, data.settings.as_ref(), summary).await?;
        summary.automation_server_config =
            write_singleton(&*s.automation_server, data.automation_server_config.as_ref(), summary).await?;
        summary.deploy_preferences =
            write_singleton(&*s.deploy_preferences, data.deploy_preferences.as_ref(), summary).await?;
        Ok(())
    }
}

/// Read, validate and parse an archive file.
async fn load_archive(path: &Path) -> Result<(Archive, ValidationReport)> {
    let raw = read_json(path).await?;

    let report = validate_archive(&raw);
    if !report.is_valid() {
        warn!(path = %path.display(), errors = report.errors.len(), "Archive rejected");
        return Err(Error::Validation {
            errors: report.errors,
        });
    }

    let archive: Archive = from_json(raw)?;
    Ok((archive, report))
}

async fn merge_into<T, S>(
    store: &S,
    archived: Option<&[T]>,
    strategy: &ResolutionStrategy,
    summary: &mut ImportSummary,
) -> Result<()>
where
    T: Identified,
    S: CollectionStore<T> + ?Sized,
{
    let Some(archived) = archived else {
        return Ok(());
    };

    let live = store.list().await.map_err(|e| partial(&e, summary))?;
    let outcome = match T::KIND.merge_policy() {
        MergePolicy::Full => merge_collection(archived, &live, strategy),
        MergePolicy::AddMissing => merge_missing_only(archived, &live),
    };

    match persist_changes(store, &live, &outcome.merged).await {
        Ok(written) => {
            debug!(kind = %T::KIND, written, "Collection merged");
            summary.record(T::KIND, outcome.stats());
            Ok(())
        }
        Err(Interrupted { committed, source }) => {
            Err(interrupted(T::KIND, committed, &source, summary))
        }
    }
}

/// Save the items of `merged` that are new or differ from `live`.
///
/// On failure, reports the saves that went through: new IDs as imported,
/// existing IDs as overwritten.
async fn persist_changes<T, S>(
    store: &S,
    live: &[T],
    merged: &[T],
) -> std::result::Result<usize, Interrupted<EntityStats>>
where
    T: Identified,
    S: CollectionStore<T> + ?Sized,
{
    let before: BTreeMap<&str, &T> = live.iter().map(|item| (item.id(), item)).collect();
    let mut committed = EntityStats::default();
    for item in merged {
        let existing = before.get(item.id());
        if existing.is_some_and(|old| *old == item) {
            continue;
        }
        if let Err(source) = store.save(item).await {
            return Err(Interrupted { committed, source });
        }
        if existing.is_some() {
            committed.overwritten += 1;
        } else {
            committed.imported += 1;
        }
    }
    Ok(committed.imported + committed.overwritten)
}

async fn replace_into<T, S>(store: &S, archived: Option<&[T]>, summary: &mut ImportSummary) -> Result<()>
where
    T: Identified,
    S: CollectionStore<T> + ?Sized,
{
    let as_stats = |outcome: ReplaceOutcome| EntityStats {
        imported: outcome.inserted,
        removed: outcome.removed,
        ..EntityStats::default()
    };

    match replace_collection(store, archived).await {
        Ok(outcome) => {
            summary.record(T::KIND, as_stats(outcome));
            Ok(())
        }
        Err(Interrupted { committed, source }) => {
            Err(interrupted(T::KIND, as_stats(committed), &source, summary))
        }
    }
}

/// Save a singleton if present. Returns whether it was written.
async fn write_singleton<T, S>(store: &S, value: Option<&T>, summary: &ImportSummary) -> Result<bool>
where
    T: Send + Sync + 'static,
    S: SingletonStore<T> + ?Sized,
{
    let Some(value) = value else {
        return Ok(false);
    };
    store.save(value).await.map_err(|e| partial(&e, summary))?;
    Ok(true)
}

/// Fold in what a failed collection committed, then build the error.
fn interrupted(
    kind: EntityKind,
    committed: EntityStats,
    source: &StoreError,
    summary: &mut ImportSummary,
) -> Error {
    if committed != EntityStats::default() {
        summary.record(kind, committed);
    }
    partial(source, summary)
}

fn partial(err: &StoreError, summary: &ImportSummary) -> Error {
    warn!(collection = err.collection(), error = %err, "Import stopped");
    Error::PartialImport {
        collection: err.collection().to_string(),
        message: err.to_string(),
        summary: Box::new(summary.clone()),
    }
}
