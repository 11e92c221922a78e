//! Common test utilities for media-scan integration tests
//!
//! Settings fixtures, failing store doubles and a coordinator builder.

#![allow(unused_imports)]
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use refresharr_media_scan::{
    ConfigStore, DownloadTask, LockStore, MediaServerClient, MemoryConfigStore, MemoryLockStore,
    MemoryTaskStore, ScanCoordinator, StoreError, StoreResult, TaskStore,
};
pub use refresharr_test_utils::{MockJellyfinServer, MockPlexServer, UNREACHABLE_URL};

/// `mediaServers` section with both servers pointing at the mocks
pub fn media_servers(jellyfin: &MockJellyfinServer, plex: &MockPlexServer) -> Value {
    json!({
        "jellyfin": { "enabled": true, "url": jellyfin.url(), "apiKey": jellyfin.api_key() },
        "plex": { "enabled": true, "url": plex.url(), "apiKey": plex.token(), "librarySectionIds": "" },
        "intervalSeconds": 3600,
        "intervalEnabled": true,
        "triggerOnQueueEmpty": true
    })
}

/// Settings document holding `section` under `mediaServers`
pub fn config_store(section: Value) -> MemoryConfigStore {
    MemoryConfigStore::new(json!({ "mediaServers": section }))
}

/// Tasks that all finished one way or another
pub fn drained_queue() -> MemoryTaskStore {
    MemoryTaskStore::new(vec![
        DownloadTask::new("t1", "track", "done"),
        DownloadTask::new("t2", "album", "error"),
        DownloadTask::new("t3", "playlist", "skipped"),
    ])
}

pub fn coordinator(
    config: MemoryConfigStore,
    tasks: Arc<dyn TaskStore>,
    lock: Arc<dyn LockStore>,
) -> ScanCoordinator {
    ScanCoordinator::new(
        Arc::new(config),
        tasks,
        lock,
        MediaServerClient::new().expect("http client"),
    )
}

/// Lock store whose backend is down
#[derive(Debug, Default)]
pub struct UnreachableLockStore {
    pub deletes: AtomicUsize,
}

#[async_trait]
impl LockStore for UnreachableLockStore {
    async fn set_if_absent(&self, _key: &str, _value: &str, _ttl: Duration) -> StoreResult<bool> {
        Err(StoreError::Timeout("redis connection"))
    }

    async fn delete(&self, _key: &str) -> StoreResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Timeout("redis connection"))
    }
}

/// Task store whose backend is down
#[derive(Debug, Default)]
pub struct UnreachableTaskStore;

#[async_trait]
impl TaskStore for UnreachableTaskStore {
    async fn get_all_tasks(&self) -> StoreResult<Vec<DownloadTask>> {
        Err(StoreError::Timeout("redis connection"))
    }
}

/// Settings store whose backing file cannot be read or written
#[derive(Debug, Default)]
pub struct UnreadableConfigStore;

#[async_trait]
impl ConfigStore for UnreadableConfigStore {
    async fn get_config(&self) -> StoreResult<Value> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        )))
    }

    async fn save_config(&self, _document: &Value) -> StoreResult<()> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        )))
    }
}
