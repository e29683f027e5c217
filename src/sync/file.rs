//! Archive file access.
//!
//! - Atomic writes: write to a temp file, sync to disk, then rename
//! - Archive reads that keep "cannot read" and "not JSON" apart

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Fixed extension of full archives.
pub const ARCHIVE_EXTENSION: &str = "stateport";

/// Write `content` to `path` atomically.
///
/// Writes to `<path>.tmp`, syncs it, then renames over the target. If any
/// step fails the original file (if any) is untouched. Parent directories
/// are created as needed.
///
/// # Errors
///
/// Returns the underlying I/O error.
pub async fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    {
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(content).await?;
        file.flush().await?;
        file.sync_all().await?;
    }

    fs::rename(&temp_path, path).await
}

/// Read a file and parse it as untyped JSON.
///
/// # Errors
///
/// [`Error::Read`] if the file cannot be read, [`Error::InvalidFormat`] if it
/// is not JSON.
pub async fn read_json(path: &Path) -> Result<Value> {
    let bytes = fs::read(path).await.map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| Error::InvalidFormat(e.to_string()))
}

/// Convert already-validated JSON into a typed value.
///
/// # Errors
///
/// [`Error::InvalidFormat`] if the shape does not match `T`.
pub fn from_json<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::InvalidFormat(e.to_string()))
}

/// Serialize `value` as pretty JSON and write it atomically.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// [`Error::Write`] if the file cannot be written.
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<usize> {
    let mut content = serde_json::to_vec_pretty(value)?;
    content.push(b'\n');
    atomic_write(path, &content)
        .await
        .map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(content.len())
}
