//! In-memory stores.
//!
//! Useful for tests and for embedding the engine without persistence.
//! All data is lost on drop. Write counters and failure injection make
//! partial-failure behavior observable.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{
    AccountStore, CollectionStore, ProjectScopedStore, SingletonStore, StoreError, StoreResult,
};
use crate::model::{DeployAccount, Identified, ProjectOwned};

/// In-memory identifier-bearing collection.
pub struct MemoryCollection<T> {
    collection: &'static str,
    items: Mutex<Vec<T>>,
    saves: AtomicUsize,
    deletes: AtomicUsize,
    /// Saves allowed before every further save fails.
    save_budget: Option<usize>,
    fail_reads: bool,
}

impl<T: Identified> MemoryCollection<T> {
    /// Create an empty collection.
    #[must_use]
    pub fn new(collection: &'static str) -> Self {
        Self::with_items(collection, Vec::new())
    }

    /// Create a collection holding `items`.
    #[must_use]
    pub fn with_items(collection: &'static str, items: Vec<T>) -> Self {
        Self {
            collection,
            items: Mutex::new(items),
            saves: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            save_budget: None,
            fail_reads: false,
        }
    }

    /// Fail every save after the first `n` succeed.
    #[must_use]
    pub fn failing_after(mut self, n: usize) -> Self {
        self.save_budget = Some(n);
        self
    }

    /// Fail every `list` call.
    #[must_use]
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Current contents.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.lock().clone()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Number of successful deletes.
    #[must_use]
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn unavailable(&self, message: &str) -> StoreError {
        StoreError::Unavailable {
            collection: self.collection.to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl<T: Identified> CollectionStore<T> for MemoryCollection<T> {
    async fn list(&self) -> StoreResult<Vec<T>> {
        if self.fail_reads {
            return Err(self.unavailable("read failed"));
        }
        Ok(self.items())
    }

    async fn save(&self, item: &T) -> StoreResult<()> {
        if self
            .save_budget
            .is_some_and(|budget| self.saves.load(Ordering::SeqCst) >= budget)
        {
            return Err(self.unavailable("write failed"));
        }

        let mut items = self.lock();
        match items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.lock().retain(|item| item.id() != id);
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl<T: Identified + ProjectOwned> ProjectScopedStore<T> for MemoryCollection<T> {
    async fn load_for_project(&self, project_id: &str) -> StoreResult<Option<T>> {
        Ok(self
            .lock()
            .iter()
            .find(|item| item.project_id() == project_id)
            .cloned())
    }
}

/// In-memory singleton config.
pub struct MemorySingleton<T> {
    collection: &'static str,
    value: Mutex<Option<T>>,
    saves: AtomicUsize,
    fail_writes: bool,
}

impl<T: Clone + Send + Sync + 'static> MemorySingleton<T> {
    #[must_use]
    pub fn new(collection: &'static str) -> Self {
        Self {
            collection,
            value: Mutex::new(None),
            saves: AtomicUsize::new(0),
            fail_writes: false,
        }
    }

    #[must_use]
    pub fn with_value(collection: &'static str, value: T) -> Self {
        let store = Self::new(collection);
        *store.lock() = Some(value);
        store
    }

    /// Fail every save.
    #[must_use]
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.lock().clone()
    }

    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> SingletonStore<T> for MemorySingleton<T> {
    async fn load(&self) -> StoreResult<Option<T>> {
        Ok(self.value())
    }

    async fn save(&self, value: &T) -> StoreResult<()> {
        if self.fail_writes {
            return Err(StoreError::Unavailable {
                collection: self.collection.to_string(),
                message: "write failed".to_string(),
            });
        }
        *self.lock() = Some(value.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory deployment accounts.
#[derive(Default)]
pub struct MemoryAccounts {
    accounts: Vec<DeployAccount>,
}

impl MemoryAccounts {
    #[must_use]
    pub fn with_accounts(accounts: Vec<DeployAccount>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl AccountStore for MemoryAccounts {
    async fn list(&self) -> StoreResult<Vec<DeployAccount>> {
        Ok(self.accounts.clone())
    }
}
