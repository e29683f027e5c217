//! The reconciliation engine.
//!
//! - **Export**: live stores → sanitized, versioned archive file
//! - **Preview**: archive file → validation report and conflict list, no writes
//! - **Import**: archive file → merge or replace into the stores
//! - **Share**: single workflows and nodes as standalone files
//!
//! # Architecture
//!
//! The per-collection algorithms are pure and generic over
//! [`Identified`](crate::model::Identified):
//!
//! - [`detect_conflicts`] intersects archive and live IDs
//! - [`merge_collection`] honors skip / overwrite / keepBoth
//! - [`merge_missing_only`] only adds, for collections referenced by ID
//! - [`replace_collection`] clears a store and refills it
//!
//! [`Exporter`] and [`Importer`] drive them against the
//! [`Stores`](crate::store::Stores), and [`ImportSession`] enforces the
//! order of import steps.
//!
//! # Example
//!
//! ```ignore
//! use stateport::store::Stores;
//! use stateport::sync::{ConflictAction, Importer, ResolutionStrategy};
//!
//! let importer = Importer::new(Stores::open_dir(&data_dir));
//! let preview = importer.preview(&path).await?;
//! println!("{} conflicts", preview.conflicts.len());
//!
//! let summary = importer
//!     .execute(&path, &ResolutionStrategy::merge(ConflictAction::KeepBoth))
//!     .await?;
//! ```

mod conflict;
mod export;
mod file;
mod hash;
mod import;
mod merge;
mod replace;
mod session;
pub mod share;
mod types;

pub use conflict::{detect_conflicts, detect_in_collection};
pub use export::{ExportOutcome, Exporter, collection_counts};
pub use file::{ARCHIVE_EXTENSION, atomic_write, read_json};
pub use hash::content_hash;
pub use import::Importer;
pub use merge::{MergeOutcome, merge_collection, merge_missing_only};
pub use replace::{ReplaceOutcome, replace_collection};
pub use session::{ImportPhase, ImportSession};
pub use share::{ShareFile, SharedItem};
pub use types::{
    ConflictAction, ConflictItem, EntityStats, ExportStats, ImportMode, ImportPreview,
    ImportSummary, ItemOverride, ResolutionStrategy,
};
