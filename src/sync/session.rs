//! Import lifecycle.
//!
//! ```text
//! Idle → FileSelected → Previewed → Merging  → Completed
//!                                 → Replacing → Failed
//! ```
//!
//! Preview never mutates anything. `Completed` and `Failed` are terminal:
//! the only way forward is selecting a file again. Every transition takes
//! `&mut self`, so one session can never run two imports at once.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::sync::import::Importer;
use crate::sync::types::{ImportMode, ImportPreview, ImportSummary, ResolutionStrategy};

/// Where an import session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    Idle,
    FileSelected,
    Previewed,
    Merging,
    Replacing,
    Completed,
    Failed,
}

impl ImportPhase {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    const fn is_running(&self) -> bool {
        matches!(self, Self::Merging | Self::Replacing)
    }
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::FileSelected => "file selected",
            Self::Previewed => "previewed",
            Self::Merging => "merging",
            Self::Replacing => "replacing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One import, driven step by step.
pub struct ImportSession {
    importer: Importer,
    phase: ImportPhase,
    path: Option<PathBuf>,
    preview: Option<ImportPreview>,
}

impl ImportSession {
    #[must_use]
    pub fn new(importer: Importer) -> Self {
        Self {
            importer,
            phase: ImportPhase::Idle,
            path: None,
            preview: None,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> ImportPhase {
        self.phase
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The last successful preview, if the session is past that step.
    #[must_use]
    pub fn last_preview(&self) -> Option<&ImportPreview> {
        self.preview.as_ref()
    }

    /// Choose the archive to import. Starts a new import from any
    /// non-running phase.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] while an import is running.
    pub fn select_file(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        if self.phase.is_running() {
            return Err(self.invalid("select a file"));
        }
        self.path = Some(path.into());
        self.preview = None;
        self.transition(ImportPhase::FileSelected);
        Ok(())
    }

    /// Validate the selected file and detect conflicts.
    ///
    /// May be repeated after a successful preview. A failed preview ends
    /// the session.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] unless a file is selected, otherwise whatever
    /// [`Importer::preview`] returns.
    pub async fn preview(&mut self) -> Result<&ImportPreview> {
        let path = match (self.phase, &self.path) {
            (ImportPhase::FileSelected | ImportPhase::Previewed, Some(path)) => path.clone(),
            _ => return Err(self.invalid("preview")),
        };

        match self.importer.preview(&path).await {
            Ok(preview) => {
                self.transition(ImportPhase::Previewed);
                Ok(self.preview.insert(preview))
            }
            Err(e) => {
                self.preview = None;
                self.transition(ImportPhase::Failed);
                Err(e)
            }
        }
    }

    /// Apply the previewed archive.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] unless the session has been previewed,
    /// otherwise whatever [`Importer::execute`] returns.
    pub async fn execute(&mut self, strategy: &ResolutionStrategy) -> Result<ImportSummary> {
        let path = match (self.phase, &self.path) {
            (ImportPhase::Previewed, Some(path)) => path.clone(),
            _ => return Err(self.invalid("import")),
        };

        self.transition(match strategy.mode {
            ImportMode::Merge => ImportPhase::Merging,
            ImportMode::Replace => ImportPhase::Replacing,
        });

        let result = self.importer.execute(&path, strategy).await;
        self.transition(if result.is_ok() {
            ImportPhase::Completed
        } else {
            ImportPhase::Failed
        });
        result
    }

    /// Forget the selected file.
    pub fn reset(&mut self) {
        self.path = None;
        self.preview = None;
        self.transition(ImportPhase::Idle);
    }

    fn transition(&mut self, next: ImportPhase) {
        debug!(from = %self.phase, to = %next, "Import phase");
        self.phase = next;
    }

    fn invalid(&self, action: &str) -> Error {
        Error::InvalidState {
            action: action.to_string(),
            phase: self.phase.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Project;
    use crate::store::Stores;
    use crate::store::memory::MemoryCollection;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_archive(dir: &TempDir, version: &str) -> PathBuf {
        let path = dir.path().join("session.stateport");
        let archive = serde_json::json!({
            "metadata": {
                "version": version,
                "appVersion": "0.1.0",
                "exportedAt": "2025-01-20T10:00:00Z",
                "exportType": "full"
            },
            "data": {"projects": [{"id": "p1"}]}
        });
        std::fs::write(&path, archive.to_string()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let dir = TempDir::new().unwrap();
        let projects = Arc::new(MemoryCollection::<Project>::new("projects"));
        let mut stores = Stores::in_memory();
        stores.projects = projects.clone();
        let mut session = ImportSession::new(Importer::new(stores));
        assert_eq!(session.phase(), ImportPhase::Idle);

        session.select_file(write_archive(&dir, "1.1.0")).unwrap();
        assert_eq!(session.phase(), ImportPhase::FileSelected);

        let preview = session.preview().await.unwrap();
        assert!(preview.conflicts.is_empty());
        assert_eq!(session.phase(), ImportPhase::Previewed);
        assert_eq!(projects.save_count(), 0);

        let summary = session.execute(&ResolutionStrategy::default()).await.unwrap();
        assert_eq!(summary.total_imported(), 1);
        assert_eq!(session.phase(), ImportPhase::Completed);
        assert!(session.phase().is_terminal());
    }

    #[tokio::test]
    async fn test_execute_requires_preview() {
        let dir = TempDir::new().unwrap();
        let mut session = ImportSession::new(Importer::new(Stores::in_memory()));

        let err = session.execute(&ResolutionStrategy::default()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));

        session.select_file(write_archive(&dir, "1.1.0")).unwrap();
        let err = session.execute(&ResolutionStrategy::default()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
        assert_eq!(session.phase(), ImportPhase::FileSelected);
    }

    #[tokio::test]
    async fn test_failed_preview_is_terminal() {
        let dir = TempDir::new().unwrap();
        let projects = Arc::new(MemoryCollection::<Project>::new("projects"));
        let mut stores = Stores::in_memory();
        stores.projects = projects.clone();
        let mut session = ImportSession::new(Importer::new(stores));

        session.select_file(write_archive(&dir, "0.1.0")).unwrap();
        assert!(matches!(
            session.preview().await,
            Err(Error::Validation { .. })
        ));
        assert_eq!(session.phase(), ImportPhase::Failed);

        let err = session.execute(&ResolutionStrategy::replace()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
        assert_eq!(projects.save_count(), 0);
        assert_eq!(projects.delete_count(), 0);
    }

    #[tokio::test]
    async fn test_new_import_restarts_from_file_selection() {
        let dir = TempDir::new().unwrap();
        let mut session = ImportSession::new(Importer::new(Stores::in_memory()));
        let path = write_archive(&dir, "1.1.0");

        session.select_file(&path).unwrap();
        session.preview().await.unwrap();
        session.execute(&ResolutionStrategy::default()).await.unwrap();

        session.select_file(&path).unwrap();
        assert_eq!(session.phase(), ImportPhase::FileSelected);
        assert!(session.last_preview().is_none());

        session.reset();
        assert_eq!(session.phase(), ImportPhase::Idle);
        assert!(session.path().is_none());
    }
}
