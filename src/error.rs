//! Error types for stateport.
//!
//! Provides structured error handling with:
//! - Machine-readable result codes (`ErrorCode`)
//! - Category-based exit codes (2=read/write, 3=format, 4=import/export, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers
//!
//! Every public engine operation returns [`Result`]. Unexpected faults inside
//! an operation are caught by [`catch_faults`] and surface as a regular error
//! value carrying the original panic message.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use futures::FutureExt;
use thiserror::Error;

use crate::sync::ImportSummary;

/// Result type alias for stateport operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable result codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Callers match on the string; shell scripts on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Cancellation (exit 0, not a failure)
    UserCancelled,

    // File access (exit 2)
    ReadError,
    WriteError,

    // Archive format (exit 3)
    InvalidFormat,

    // Engine (exit 4)
    ImportError,
    ExportError,

    // Usage (exit 5)
    InvalidArgument,
    InvalidState,
    NotFound,

    // Config (exit 7)
    ConfigError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::UserCancelled => "USER_CANCELLED",
            Self::ReadError => "READ_ERROR",
            Self::WriteError => "WRITE_ERROR",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::ImportError => "IMPORT_ERROR",
            Self::ExportError => "EXPORT_ERROR",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidState => "INVALID_STATE",
            Self::NotFound => "NOT_FOUND",
            Self::ConfigError => "CONFIG_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::UserCancelled => 0,
            Self::InternalError => 1,
            Self::ReadError | Self::WriteError => 2,
            Self::InvalidFormat => 3,
            Self::ImportError | Self::ExportError => 4,
            Self::InvalidArgument | Self::InvalidState | Self::NotFound => 5,
            Self::ConfigError => 7,
        }
    }

    /// Whether retrying with corrected input can succeed.
    ///
    /// True for usage errors and transient file access failures. False for
    /// malformed archives and engine failures.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ReadError
                | Self::WriteError
                | Self::InvalidArgument
                | Self::InvalidState
                | Self::NotFound
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in stateport operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid archive format: {0}")]
    InvalidFormat(String),

    #[error("Archive validation failed: {}", errors.join("; "))]
    Validation { errors: Vec<String> },

    #[error("Import failed: {0}")]
    Import(String),

    #[error("Import stopped at {collection}: {message}")]
    PartialImport {
        collection: String,
        message: String,
        /// Everything committed before the failing collection.
        summary: Box<ImportSummary>,
    },

    #[error("Export failed: {0}")]
    Export(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("Cannot {action} while import is {phase}")]
    InvalidState { action: String, phase: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Cancelled => ErrorCode::UserCancelled,
            Self::Read { .. } => ErrorCode::ReadError,
            Self::Write { .. } => ErrorCode::WriteError,
            Self::InvalidFormat(_) | Self::Validation { .. } => ErrorCode::InvalidFormat,
            Self::Import(_) | Self::PartialImport { .. } => ErrorCode::ImportError,
            Self::Export(_) => ErrorCode::ExportError,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::InvalidState { .. } => ErrorCode::InvalidState,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Json(_) | Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Read { path, .. } => Some(format!(
                "Check that {} exists and is readable.",
                path.display()
            )),
            Self::Write { path, .. } => Some(format!(
                "Check that the directory for {} exists and is writable.",
                path.display()
            )),
            Self::InvalidFormat(_) => Some(
                "The file is not a stateport archive. Use `stateport validate <file>` for details."
                    .to_string(),
            ),
            Self::Validation { errors } if errors.iter().any(|e| e.contains("older than")) => Some(
                "This archive was written by a release that is no longer supported. \
                 Re-export it with a newer version."
                    .to_string(),
            ),
            Self::PartialImport { collection, .. } => Some(format!(
                "Collections before {collection} were committed and are not rolled back. \
                 Fix the store and run the import again."
            )),
            Self::NotFound { kind, .. } => Some(format!(
                "No {kind} with that ID. Use `stateport preview` on an export to list IDs."
            )),
            Self::InvalidState { .. } => {
                Some("Select the file again to start a new import.".to_string())
            }
            Self::InvalidArgument(msg) if msg.contains("override") => Some(
                "Overrides use TYPE:ID=ACTION, e.g. project:proj_1=overwrite. \
                 Actions: skip, overwrite, keep-both"
                    .to_string(),
            ),
            Self::Cancelled
            | Self::Validation { .. }
            | Self::Import(_)
            | Self::Export(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Json(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes result code, message, retryability, exit code, and optional
    /// recovery hint. Validation failures list every violation and partial
    /// imports include the summary of what was committed.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "success": false,
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        match self {
            Self::Validation { errors } => {
                obj["error"]["errors"] = serde_json::json!(errors);
            }
            Self::PartialImport { summary, .. } => {
                obj["error"]["summary"] =
                    serde_json::to_value(summary.as_ref()).unwrap_or_default();
            }
            _ => {}
        }

        obj
    }
}

/// Run an operation, converting a panic inside it into an error value.
///
/// `wrap` builds the error from the panic message, so each public operation
/// reports faults under its own result code.
pub async fn catch_faults<T, F>(operation: F, wrap: fn(String) -> Error) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(operation).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(%message, "Unexpected fault");
            Err(wrap(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown fault".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_codes_match_wire_tags() {
        assert_eq!(Error::Cancelled.error_code().as_str(), "USER_CANCELLED");
        assert_eq!(
            Error::InvalidFormat("x".into()).error_code().as_str(),
            "INVALID_FORMAT"
        );
        assert_eq!(Error::Import("x".into()).error_code().as_str(), "IMPORT_ERROR");
        assert_eq!(Error::Export("x".into()).error_code().as_str(), "EXPORT_ERROR");
        let read = Error::Read {
            path: PathBuf::from("/x"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(read.error_code().as_str(), "READ_ERROR");
    }

    #[test]
    fn test_cancel_is_not_a_failure_exit() {
        assert_eq!(Error::Cancelled.exit_code(), 0);
    }

    #[test]
    fn test_validation_message_joins_every_error() {
        let err = Error::Validation {
            errors: vec!["first".into(), "second".into()],
        };
        assert_eq!(err.to_string(), "Archive validation failed: first; second");

        let json = err.to_structured_json();
        assert_eq!(json["error"]["errors"].as_array().unwrap().len(), 2);
        assert_eq!(json["success"], false);
    }

    #[test]
    fn test_partial_import_carries_summary() {
        let err = Error::PartialImport {
            collection: "workflows".into(),
            message: "disk full".into(),
            summary: Box::default(),
        };
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "IMPORT_ERROR");
        assert!(json["error"]["summary"].is_object());
        assert!(err.hint().unwrap().contains("workflows"));
    }

    #[tokio::test]
    async fn test_catch_faults_converts_panic() {
        let exploding = async {
            if std::hint::black_box(true) {
                panic!("store exploded");
            }
            Ok(())
        };
        let result: Result<()> = catch_faults(exploding, Error::Import).await;

        match result {
            Err(Error::Import(msg)) => assert_eq!(msg, "store exploded"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_catch_faults_passes_through_errors() {
        let result: Result<()> =
            catch_faults(async { Err(Error::Cancelled) }, Error::Export).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
