//! Archive export.
//!
//! The exporter reads every collection from the stores, strips credentials
//! and wraps the result in a versioned envelope:
//!
//! 1. Top-level collections are fetched concurrently
//! 2. Per-project records are fetched one project at a time
//! 3. Credential references and deployment tokens are removed
//! 4. The archive is stamped with the current format version
//!
//! # Cancellation
//!
//! A caller that aborts choosing a destination passes `None` to
//! [`Exporter::export_to`] and gets [`ExportOutcome::Cancelled`] back. That
//! is a normal outcome, not an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{Error, Result, catch_faults};
use crate::model::{Archive, CollectionSet, EntityKind, ExportType, Metadata};
use crate::store::Stores;
use crate::sync::file::write_json;
use crate::sync::types::ExportStats;
use crate::version::CURRENT_FORMAT_VERSION;

/// Result of an export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { path: PathBuf, stats: ExportStats },
    Cancelled,
}

/// Builds archives from live store state.
pub struct Exporter {
    stores: Stores,
    app_version: String,
}

impl Exporter {
    /// Create an exporter stamping `app_version` into every archive.
    #[must_use]
    pub fn new(stores: Stores, app_version: impl Into<String>) -> Self {
        Self {
            stores,
            app_version: app_version.into(),
        }
    }

    /// Assemble a sanitized archive of the current state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Export`] if a store fails or an unexpected fault occurs.
    pub async fn assemble(&self) -> Result<Archive> {
        catch_faults(self.assemble_inner(), Error::Export).await
    }

    async fn assemble_inner(&self) -> Result<Archive> {
        let mut data = self
            .stores
            .snapshot()
            .await
            .map_err(|e| Error::Export(e.to_string()))?;
        data.sanitize();

        Ok(Archive {
            metadata: Metadata {
                version: CURRENT_FORMAT_VERSION.to_string(),
                app_version: self.app_version.clone(),
                exported_at: Utc::now().to_rfc3339(),
                export_type: ExportType::Full,
            },
            data,
        })
    }

    /// Assemble an archive and write it to `destination`.
    ///
    /// `None` means the destination choice was aborted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Export`] if assembly fails and [`Error::Write`] if the
    /// file cannot be written.
    pub async fn export_to(&self, destination: Option<&Path>) -> Result<ExportOutcome> {
        let Some(path) = destination else {
            info!("Export cancelled");
            return Ok(ExportOutcome::Cancelled);
        };

        let archive = self.assemble().await?;
        let bytes = write_json(path, &archive).await?;

        let stats = ExportStats {
            counts: collection_counts(&archive.data),
            bytes,
        };
        info!(path = %path.display(), records = stats.total(), bytes, "Archive written");

        Ok(ExportOutcome::Written {
            path: path.to_path_buf(),
            stats,
        })
    }
}

/// Items per collection key, counting each present singleton as one.
#[must_use]
pub fn collection_counts(data: &CollectionSet) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for kind in EntityKind::ALL {
        if let Some(n) = data.count(kind) {
            counts.insert(kind.collection_key().to_string(), n);
        }
    }
    if let Some(accounts) = &data.deploy_accounts {
        counts.insert("deployAccounts".to_string(), accounts.len());
    }
    for (key, present) in [
        ("settings", data.settings.is_some()),
        ("automationServerConfig", data.automation_server_config.is_some()),
        ("deployPreferences", data.deploy_preferences.is_some()),
    ] {
        if present {
            counts.insert(key.to_string(), 1);
        }
    }
    debug!(collections = counts.len(), "Counted collections");
    counts
}
