//! Store boundaries used by scan coordination
//!
//! - [`ConfigStore`]: the main settings document (holds `mediaServers`)
//! - [`TaskStore`]: download task records written by the downloader
//! - [`LockStore`]: atomic set-if-absent with expiry, shared by every
//!   process that may trigger a scan
//!
//! The coordinator only sees the traits. Concrete implementations live in
//! the submodules.

mod file;
mod memory;
mod redis;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreResult;
use crate::tasks::DownloadTask;

pub use self::file::JsonFileConfigStore;
pub use self::memory::{MemoryConfigStore, MemoryLockStore, MemoryTaskStore};
pub use self::redis::{RedisLockStore, RedisTaskStore};

/// Persisted settings document
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the whole settings document
    async fn get_config(&self) -> StoreResult<Value>;

    /// Replace the whole settings document
    async fn save_config(&self, document: &Value) -> StoreResult<()>;
}

/// Source of download task records
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn get_all_tasks(&self) -> StoreResult<Vec<DownloadTask>>;
}

/// Distributed key-value store with an atomic set-if-absent primitive
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Set `key` to `value` with a time-to-live unless it already exists.
    ///
    /// Returns `Ok(false)` when the key is already held.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool>;

    /// Remove `key`; removing a missing key is not an error
    async fn delete(&self, key: &str) -> StoreResult<()>;
}
