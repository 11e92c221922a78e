//! Scan coordinator
//!
//! Three ways into a library refresh:
//!
//! - [`ScanCoordinator::manual_scan`]: on request, no gating, errors surface
//! - [`ScanCoordinator::queue_empty_triggered_scan`]: after downloads drain
//! - [`ScanCoordinator::interval_triggered_scan`]: on the periodic schedule
//!
//! The two automatic paths share the global [`ScanLock`] and never return an
//! error; they report whether a scan was triggered. The `*_outcome` variants
//! also say why a scan did not happen.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::client::{MediaServerClient, TriggerOutcome};
use crate::error::ScanResult;
use crate::lock::{LockOutcome, ScanLock};
use crate::settings::{
    get_media_server_config, validate_media_server_config, MediaServerConfig, MEDIA_SERVERS_KEY,
};
use crate::store::{ConfigStore, LockStore, TaskStore};
use crate::tasks;

/// Combined result of a manual scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub jellyfin: TriggerOutcome,
    pub plex: TriggerOutcome,
    /// Unix seconds
    pub timestamp: f64,
}

/// How an automatic scan attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoScanOutcome {
    /// The path's setting is off
    Disabled,
    /// Downloads are still running (or the task store is unreadable)
    QueueBusy,
    /// Another scan holds the lock
    LockHeld,
    /// Both servers were triggered without error
    Triggered,
    /// Both servers were attempted and at least one trigger failed
    Failed,
}

impl AutoScanOutcome {
    /// Whether remote triggers were attempted
    pub fn attempted(self) -> bool {
        matches!(self, Self::Triggered | Self::Failed)
    }

    pub fn succeeded(self) -> bool {
        self == Self::Triggered
    }
}

/// Which automatic path is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AutoTrigger {
    QueueEmpty,
    Interval,
}

impl AutoTrigger {
    fn enabled(self, config: &MediaServerConfig) -> bool {
        match self {
            Self::QueueEmpty => config.trigger_on_queue_empty,
            Self::Interval => config.interval_enabled,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::QueueEmpty => "queue_empty",
            Self::Interval => "interval",
        }
    }
}

/// Entry points for triggering media server scans
#[derive(Clone)]
pub struct ScanCoordinator {
    config_store: Arc<dyn ConfigStore>,
    task_store: Arc<dyn TaskStore>,
    lock: ScanLock,
    client: MediaServerClient,
}

impl std::fmt::Debug for ScanCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanCoordinator")
            .field("lock", &self.lock)
            .field("client", &self.client)
            .finish()
    }
}

impl ScanCoordinator {
    pub fn new(
        config_store: Arc<dyn ConfigStore>,
        task_store: Arc<dyn TaskStore>,
        lock_store: Arc<dyn LockStore>,
        client: MediaServerClient,
    ) -> Self {
        Self {
            config_store,
            task_store,
            lock: ScanLock::new(lock_store),
            client,
        }
    }

    /// Current settings merged onto defaults
    pub async fn media_server_config(&self) -> MediaServerConfig {
        get_media_server_config(self.config_store.as_ref()).await
    }

    /// Validate `raw`, store it as the `mediaServers` section and return the
    /// merged result.
    ///
    /// The whole section is replaced; the rest of the document is untouched.
    #[instrument(skip(self, raw))]
    pub async fn update_media_server_config(&self, raw: Value) -> ScanResult<MediaServerConfig> {
        validate_media_server_config(&raw)?;

        let mut document = match self.config_store.get_config().await? {
            Value::Object(map) => map,
            other => {
                warn!(kind = %json_kind(&other), "Settings document is not an object, starting fresh");
                Map::new()
            }
        };
        document.insert(MEDIA_SERVERS_KEY.to_string(), raw);

        let document = Value::Object(document);
        self.config_store.save_config(&document).await?;
        info!("Media server settings updated");

        Ok(MediaServerConfig::from_document(&document))
    }

    /// Trigger both servers now, Jellyfin first.
    ///
    /// No gating or locking. The first failure aborts.
    #[instrument(skip(self))]
    pub async fn manual_scan(&self) -> ScanResult<ScanReport> {
        let config = self.media_server_config().await;

        let jellyfin = self.client.trigger_jellyfin_scan(&config).await?;
        let plex = self.client.trigger_plex_scan(&config).await?;

        info!("Manual media server scan triggered");
        Ok(ScanReport {
            jellyfin,
            plex,
            timestamp: unix_timestamp(),
        })
    }

    /// Whether no track, album or playlist download is still active.
    ///
    /// An unreadable task store counts as not empty.
    pub async fn queue_is_empty(&self) -> bool {
        match self.task_store.get_all_tasks().await {
            Ok(tasks) => tasks::queue_is_empty(&tasks),
            Err(e) => {
                warn!(error = %e, "Failed to read download tasks, assuming queue is busy");
                false
            }
        }
    }

    /// Scan if enabled, the queue has drained and no other scan is running
    pub async fn queue_empty_triggered_scan(&self) -> bool {
        self.queue_empty_scan_outcome().await.succeeded()
    }

    /// [`Self::queue_empty_triggered_scan`] with the reason it ended
    pub async fn queue_empty_scan_outcome(&self) -> AutoScanOutcome {
        self.run_automatic(AutoTrigger::QueueEmpty).await
    }

    /// Scan if interval scans are enabled, the queue has drained and no
    /// other scan is running
    pub async fn interval_triggered_scan(&self) -> bool {
        self.interval_scan_outcome().await.succeeded()
    }

    /// [`Self::interval_triggered_scan`] with the reason it ended
    pub async fn interval_scan_outcome(&self) -> AutoScanOutcome {
        self.run_automatic(AutoTrigger::Interval).await
    }

    #[instrument(skip(self, trigger), fields(trigger = trigger.as_str()))]
    async fn run_automatic(&self, trigger: AutoTrigger) -> AutoScanOutcome {
        let config = self.media_server_config().await;
        if !trigger.enabled(&config) {
            debug!("Automatic scan disabled");
            return AutoScanOutcome::Disabled;
        }

        if !self.queue_is_empty().await {
            debug!("Download queue not empty, skipping scan");
            return AutoScanOutcome::QueueBusy;
        }

        let guard = match self.lock.acquire().await {
            Ok(LockOutcome::Acquired(guard)) => Some(guard),
            Ok(LockOutcome::Held) => {
                debug!("Another scan holds the lock, skipping");
                return AutoScanOutcome::LockHeld;
            }
            Err(e) => {
                // Overlapping scans are possible until the store recovers
                warn!(error = %e, "Scan lock unavailable, scanning without it");
                None
            }
        };

        let jellyfin = self.client.trigger_jellyfin_scan(&config).await;
        let plex = self.client.trigger_plex_scan(&config).await;

        if let Some(guard) = guard {
            guard.release().await;
        }

        let mut ok = true;
        for (server, result) in [("jellyfin", &jellyfin), ("plex", &plex)] {
            if let Err(e) = result {
                error!(server, error = %e, "Automatic scan trigger failed");
                ok = false;
            }
        }

        if ok {
            info!("Triggered media server scan");
            AutoScanOutcome::Triggered
        } else {
            AutoScanOutcome::Failed
        }
    }
}

fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<ScanReport> for Value {
    fn from(report: ScanReport) -> Self {
        serde_json::to_value(report).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;
    use crate::store::{MemoryConfigStore, MemoryLockStore, MemoryTaskStore};
    use crate::tasks::DownloadTask;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn coordinator(config: MemoryConfigStore, tasks: MemoryTaskStore) -> ScanCoordinator {
        ScanCoordinator::new(
            Arc::new(config),
            Arc::new(tasks),
            Arc::new(MemoryLockStore::new()),
            MediaServerClient::new().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_update_replaces_section_and_keeps_other_keys() {
        let store = MemoryConfigStore::new(json!({
            "downloads": { "threads": 4 },
            "mediaServers": { "plex": { "enabled": true, "url": "http://old", "apiKey": "x" } }
        }));
        let coordinator = coordinator(store.clone(), MemoryTaskStore::default());

        let merged = coordinator
            .update_media_server_config(json!({ "intervalEnabled": true, "intervalSeconds": 120 }))
            .await
            .unwrap();

        assert!(merged.interval_enabled);
        assert_eq!(merged.interval_seconds, 120);
        assert!(!merged.plex.enabled);

        let saved = store.snapshot();
        assert_eq!(saved["downloads"]["threads"], 4);
        assert_eq!(
            saved["mediaServers"],
            json!({ "intervalEnabled": true, "intervalSeconds": 120 })
        );
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_settings_without_saving() {
        let store = MemoryConfigStore::new(json!({ "other": true }));
        let coordinator = coordinator(store.clone(), MemoryTaskStore::default());

        let err = coordinator
            .update_media_server_config(json!({ "intervalSeconds": 30 }))
            .await
            .unwrap_err();

        assert_matches!(err, ScanError::Validation(_));
        assert_eq!(err.to_string(), "intervalSeconds must be >= 60");
        assert_eq!(store.snapshot(), json!({ "other": true }));
    }

    #[tokio::test]
    async fn test_update_replaces_non_object_document() {
        let store = MemoryConfigStore::new(json!([1, 2, 3]));
        let coordinator = coordinator(store.clone(), MemoryTaskStore::default());

        coordinator
            .update_media_server_config(json!({ "triggerOnQueueEmpty": true }))
            .await
            .unwrap();

        assert_eq!(
            store.snapshot(),
            json!({ "mediaServers": { "triggerOnQueueEmpty": true } })
        );
    }

    #[tokio::test]
    async fn test_manual_scan_with_everything_disabled() {
        let coordinator = coordinator(MemoryConfigStore::empty(), MemoryTaskStore::default());

        let report = coordinator.manual_scan().await.unwrap();
        assert!(report.jellyfin.is_skipped());
        assert!(report.plex.is_skipped());
        assert!(report.timestamp > 0.0);
    }

    #[tokio::test]
    async fn test_automatic_paths_respect_their_own_flag() {
        let store = MemoryConfigStore::new(json!({
            "mediaServers": { "triggerOnQueueEmpty": true, "intervalEnabled": false }
        }));
        let coordinator = coordinator(store, MemoryTaskStore::default());

        // Both servers disabled, so a scan "succeeds" without network calls
        assert!(coordinator.queue_empty_triggered_scan().await);
        assert!(!coordinator.interval_triggered_scan().await);
    }

    #[tokio::test]
    async fn test_busy_queue_blocks_automatic_scans() {
        let store = MemoryConfigStore::new(json!({
            "mediaServers": { "triggerOnQueueEmpty": true, "intervalEnabled": true }
        }));
        let tasks = MemoryTaskStore::new(vec![DownloadTask::new("t1", "album", "downloading")]);
        let coordinator = coordinator(store, tasks.clone());

        assert!(!coordinator.queue_is_empty().await);
        assert!(!coordinator.queue_empty_triggered_scan().await);
        assert!(!coordinator.interval_triggered_scan().await);

        tasks.set_tasks(vec![DownloadTask::new("t1", "album", "done")]);
        assert!(coordinator.interval_triggered_scan().await);
    }

    #[test]
    fn test_report_serializes_like_the_api_response() {
        let report = ScanReport {
            jellyfin: TriggerOutcome::triggered(),
            plex: TriggerOutcome::skipped(),
            timestamp: 1700000000.5,
        };
        assert_eq!(
            Value::from(report),
            json!({
                "jellyfin": { "triggered": true },
                "plex": { "skipped": true },
                "timestamp": 1700000000.5
            })
        );
    }
}
