//! In-process store implementations
//!
//! Useful for tests and single-process setups. [`MemoryLockStore`] only
//! excludes callers within one process; deployments running several
//! instances need [`super::RedisLockStore`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{ConfigStore, LockStore, TaskStore};
use crate::error::StoreResult;
use crate::tasks::DownloadTask;

/// Settings document held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    document: Arc<Mutex<Value>>,
}

impl MemoryConfigStore {
    pub fn new(document: Value) -> Self {
        Self {
            document: Arc::new(Mutex::new(document)),
        }
    }

    /// Empty settings document
    pub fn empty() -> Self {
        Self::new(Value::Object(Map::new()))
    }

    /// Current document contents
    pub fn snapshot(&self) -> Value {
        self.document
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get_config(&self) -> StoreResult<Value> {
        Ok(self.snapshot())
    }

    async fn save_config(&self, document: &Value) -> StoreResult<()> {
        *self.document.lock().unwrap_or_else(|e| e.into_inner()) = document.clone();
        Ok(())
    }
}

/// Fixed list of task records
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    tasks: Arc<Mutex<Vec<DownloadTask>>>,
}

impl MemoryTaskStore {
    pub fn new(tasks: Vec<DownloadTask>) -> Self {
        Self {
            tasks: Arc::new(Mutex::new(tasks)),
        }
    }

    /// Replace the task list
    pub fn set_tasks(&self, tasks: Vec<DownloadTask>) {
        *self.tasks.lock().unwrap_or_else(|e| e.into_inner()) = tasks;
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn get_all_tasks(&self) -> StoreResult<Vec<DownloadTask>> {
        Ok(self.tasks.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

struct LockEntry {
    value: String,
    expires_at: Instant,
}

/// Expiring keys held in memory
#[derive(Clone, Default)]
pub struct MemoryLockStore {
    entries: Arc<Mutex<HashMap<String, LockEntry>>>,
    deletes: Arc<AtomicUsize>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `key` if present and unexpired
    pub fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Remaining time-to-live of `key`
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .and_then(|entry| entry.expires_at.checked_duration_since(Instant::now()))
    }

    /// Number of delete calls seen so far
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for MemoryLockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let held = self.entries.lock().map(|e| e.len()).unwrap_or_default();
        f.debug_struct("MemoryLockStore")
            .field("keys", &held)
            .finish()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        if entries.get(key).is_some_and(|entry| entry.expires_at > now) {
            return Ok(false);
        }

        entries.insert(
            key.to_string(),
            LockEntry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}
