//! Global scan lock
//!
//! One key in the shared [`LockStore`] marks a scan in flight. Both
//! automatic triggers use the same key, so a queue-empty scan and an
//! interval scan never overlap, across every process sharing the store.
//! The key expires after [`SCAN_LOCK_TTL`] in case its holder dies; it is
//! never renewed.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::LockStore;

/// Key of the scan lock
pub const SCAN_LOCK_KEY: &str = "media_servers:scan_lock";

/// Expiry of the scan lock
pub const SCAN_LOCK_TTL: Duration = Duration::from_secs(300);

/// The lock store could not be reached; callers may proceed unlocked
#[derive(Error, Debug)]
#[error("scan lock store unavailable: {0}")]
pub struct LockUnavailable(#[from] pub StoreError);

/// Result of an acquisition attempt
#[derive(Debug)]
pub enum LockOutcome {
    /// This caller holds the lock until the guard is released
    Acquired(ScanLockGuard),
    /// Another caller holds the lock
    Held,
}

/// Handle on the global scan lock
#[derive(Clone)]
pub struct ScanLock {
    store: Arc<dyn LockStore>,
    key: String,
    ttl: Duration,
}

impl std::fmt::Debug for ScanLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanLock")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl ScanLock {
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self {
            store,
            key: SCAN_LOCK_KEY.to_string(),
            ttl: SCAN_LOCK_TTL,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Try to take the lock; the stored value is the current unix timestamp
    pub async fn acquire(&self) -> Result<LockOutcome, LockUnavailable> {
        let value = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
        let acquired = self
            .store
            .set_if_absent(&self.key, &value.to_string(), self.ttl)
            .await?;

        if acquired {
            debug!(key = %self.key, "Scan lock acquired");
            Ok(LockOutcome::Acquired(ScanLockGuard {
                store: Arc::clone(&self.store),
                key: self.key.clone(),
                released: false,
            }))
        } else {
            debug!(key = %self.key, "Scan lock already held");
            Ok(LockOutcome::Held)
        }
    }
}

/// Proof of lock ownership.
///
/// Call [`ScanLockGuard::release`] when done. A guard dropped without being
/// released (panic, cancelled future) schedules the delete on the current
/// tokio runtime.
pub struct ScanLockGuard {
    store: Arc<dyn LockStore>,
    key: String,
    released: bool,
}

impl std::fmt::Debug for ScanLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanLockGuard")
            .field("key", &self.key)
            .field("released", &self.released)
            .finish()
    }
}

impl ScanLockGuard {
    /// Delete the lock key. Failures are logged; the TTL cleans up.
    pub async fn release(mut self) {
        self.released = true;
        match self.store.delete(&self.key).await {
            Ok(()) => debug!(key = %self.key, "Scan lock released"),
            Err(e) => warn!(key = %self.key, error = %e, "Failed to release scan lock"),
        }
    }
}

impl Drop for ScanLockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let store = Arc::clone(&self.store);
        let key = std::mem::take(&mut self.key);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = store.delete(&key).await {
                        warn!(key = %key, error = %e, "Failed to release dropped scan lock");
                    }
                });
            }
            Err(_) => warn!(key = %key, "Scan lock dropped outside a runtime, leaving it to expire"),
        }
    }
}
