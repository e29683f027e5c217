//! stateport - Versioned export and conflict-aware import of workspace state
//!
//! This crate provides the core functionality for the `stateport` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Archive and entity types (projects, workflows, integrations, preferences)
//! - [`store`] - Async store traits with JSON-file and in-memory backends
//! - [`sync`] - Export, preview, import and sharing
//! - [`validate`] - Structural archive validation
//! - [`version`] - Archive format version gate
//! - [`config`] - Data directory resolution
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod store;
pub mod sync;
pub mod validate;
pub mod version;

pub use error::{Error, Result};
