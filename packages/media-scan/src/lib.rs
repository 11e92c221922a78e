//! Media server library refresh coordination for Refresharr
//!
//! This crate decides when to ask Jellyfin and Plex to rescan their
//! libraries and sends the requests:
//! - Media server settings with defaults and validation
//! - Download queue inspection (is anything still downloading?)
//! - Jellyfin and Plex refresh triggers
//! - A global scan lock so automatic scans never overlap
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use refresharr_media_scan::{
//!     JsonFileConfigStore, MediaServerClient, RedisLockStore, RedisTaskStore, ScanCoordinator,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let timeout = Duration::from_secs(5);
//! let coordinator = ScanCoordinator::new(
//!     Arc::new(JsonFileConfigStore::new("./data/config/main.json")),
//!     Arc::new(RedisTaskStore::open("redis://localhost:6379", timeout)?),
//!     Arc::new(RedisLockStore::open("redis://localhost:6379", timeout)?),
//!     MediaServerClient::new()?,
//! );
//!
//! if coordinator.queue_empty_triggered_scan().await {
//!     println!("scan triggered");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod coordinator;
pub mod error;
pub mod lock;
pub mod settings;
pub mod store;
pub mod tasks;

pub use client::{MediaServerClient, SectionRefresh, TriggerOutcome};
pub use coordinator::{AutoScanOutcome, ScanCoordinator, ScanReport};
pub use error::{ScanError, ScanResult, StoreError, StoreResult, ValidationError};
pub use lock::{LockOutcome, LockUnavailable, ScanLock, ScanLockGuard, SCAN_LOCK_KEY, SCAN_LOCK_TTL};
pub use settings::{
    get_media_server_config, validate_media_server_config, validation_outcome, MediaServerConfig,
    ServerConfig,
};
pub use store::{
    ConfigStore, JsonFileConfigStore, LockStore, MemoryConfigStore, MemoryLockStore,
    MemoryTaskStore, RedisLockStore, RedisTaskStore, TaskStore,
};
pub use tasks::{queue_is_empty, DownloadTask, DownloadType, TaskStatus};
