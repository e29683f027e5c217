//! File-backed stores.
//!
//! Each collection lives in `<data_dir>/<collection>.json`: an array for
//! identifier-bearing collections, an object for singletons. Every write
//! reads the whole file, mutates it and writes it back atomically, so the
//! store holds an async mutex across that cycle.

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::trace;

use super::{
    AccountStore, CollectionStore, ProjectScopedStore, SingletonStore, StoreError, StoreResult,
};
use crate::model::{DeployAccount, Identified, ProjectOwned};
use crate::sync::atomic_write;

/// Shared file access for both store kinds.
struct JsonFile {
    collection: &'static str,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFile {
    fn new(dir: &Path, collection: &'static str) -> Self {
        Self {
            collection,
            path: dir.join(format!("{collection}.json")),
            write_lock: Mutex::new(()),
        }
    }

    /// Read and parse the file. `None` if it does not exist yet.
    async fn read<V: DeserializeOwned>(&self) -> StoreResult<Option<V>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| StoreError::Malformed {
                    collection: self.collection.to_string(),
                    source,
                }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(self.io_error(source)),
        }
    }

    async fn write<V: Serialize + ?Sized>(&self, value: &V) -> StoreResult<()> {
        let content = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Malformed {
            collection: self.collection.to_string(),
            source,
        })?;
        trace!(path = %self.path.display(), bytes = content.len(), "Writing store file");
        atomic_write(&self.path, &content)
            .await
            .map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            collection: self.collection.to_string(),
            source,
        }
    }
}

/// Identifier-bearing collection stored as a JSON array.
pub struct JsonCollectionStore<T> {
    file: JsonFile,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Identified> JsonCollectionStore<T> {
    #[must_use]
    pub fn new(dir: &Path, collection: &'static str) -> Self {
        Self {
            file: JsonFile::new(dir, collection),
            _marker: PhantomData,
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file.path
    }

    async fn read_all(&self) -> StoreResult<Vec<T>> {
        Ok(self.file.read().await?.unwrap_or_default())
    }
}

#[async_trait]
impl<T: Identified> CollectionStore<T> for JsonCollectionStore<T> {
    async fn list(&self) -> StoreResult<Vec<T>> {
        self.read_all().await
    }

    async fn save(&self, item: &T) -> StoreResult<()> {
        let _guard = self.file.write_lock.lock().await;
        let mut items = self.read_all().await?;
        match items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
        self.file.write(&items).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let _guard = self.file.write_lock.lock().await;
        let mut items = self.read_all().await?;
        let before = items.len();
        items.retain(|item| item.id() != id);
        if items.len() == before {
            return Ok(());
        }
        self.file.write(&items).await
    }
}

#[async_trait]
impl<T: Identified + ProjectOwned> ProjectScopedStore<T> for JsonCollectionStore<T> {
    async fn load_for_project(&self, project_id: &str) -> StoreResult<Option<T>> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .find(|item| item.project_id() == project_id))
    }
}

/// Singleton config stored as a JSON object.
pub struct JsonSingletonStore<T> {
    file: JsonFile,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonSingletonStore<T> {
    #[must_use]
    pub fn new(dir: &Path, collection: &'static str) -> Self {
        Self {
            file: JsonFile::new(dir, collection),
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T> SingletonStore<T> for JsonSingletonStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn load(&self) -> StoreResult<Option<T>> {
        self.file.read().await
    }

    async fn save(&self, value: &T) -> StoreResult<()> {
        let _guard = self.file.write_lock.lock().await;
        self.file.write(value).await
    }
}

/// Deployment accounts, read from `deployAccounts.json`.
pub struct JsonAccountStore {
    file: JsonFile,
}

impl JsonAccountStore {
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self {
            file: JsonFile::new(dir, "deployAccounts"),
        }
    }
}

#[async_trait]
impl AccountStore for JsonAccountStore {
    async fn list(&self) -> StoreResult<Vec<DeployAccount>> {
        Ok(self.file.read().await?.unwrap_or_default())
    }
}
