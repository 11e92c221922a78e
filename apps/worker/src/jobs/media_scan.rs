//! Automatic media server scans
//!
//! Two loops drive the coordinator's automatic entry points:
//! - the queue watcher polls the download queue and scans when it drains
//! - the interval schedule scans every `intervalSeconds` while enabled
//!
//! Both stop when the shutdown channel flips to `true`.

use std::sync::Arc;
use std::time::Duration;

use refresharr_media_scan::settings::MIN_INTERVAL_SECONDS;
use refresharr_media_scan::{AutoScanOutcome, ScanCoordinator};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{WorkerError, WorkerResult};

/// Tracks busy to empty transitions of the download queue
///
/// Starts out idle, so an empty queue at startup does not trigger a scan.
#[derive(Debug, Default)]
pub struct QueueWatcher {
    was_busy: bool,
}

impl QueueWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest queue state, returning true when the queue just drained
    pub fn observe(&mut self, empty: bool) -> bool {
        let drained = empty && self.was_busy;
        self.was_busy = !empty;
        drained
    }
}

/// Time of the last interval scan
#[derive(Debug, Clone, Copy)]
pub struct IntervalSchedule {
    last_scan: Instant,
}

impl IntervalSchedule {
    /// The first scan becomes due one interval after `start`
    pub fn starting_at(start: Instant) -> Self {
        Self { last_scan: start }
    }

    pub fn is_due(&self, now: Instant, interval: Duration) -> bool {
        now.saturating_duration_since(self.last_scan) >= interval
    }

    pub fn mark(&mut self, now: Instant) {
        self.last_scan = now;
    }
}

/// Interval between periodic scans, clamped to the accepted minimum
pub fn scan_interval(interval_seconds: i64) -> Duration {
    Duration::from_secs(interval_seconds.max(MIN_INTERVAL_SECONDS) as u64)
}

/// Poll the download queue and scan each time it drains
pub async fn run_queue_watch(
    coordinator: Arc<ScanCoordinator>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> WorkerResult<()> {
    tracing::info!(poll_secs = poll_interval.as_secs_f64(), "Queue watcher started");

    let mut watcher = QueueWatcher::new();
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                return stop_or_cancel(changed, &shutdown, "queue watcher");
            }
        }

        let empty = coordinator.queue_is_empty().await;
        if !watcher.observe(empty) {
            continue;
        }

        tracing::debug!("Download queue drained");
        if coordinator.queue_empty_triggered_scan().await {
            tracing::info!("Queue-empty scan completed");
        }
    }
}

/// Scan every configured interval while interval scans are enabled
pub async fn run_interval_schedule(
    coordinator: Arc<ScanCoordinator>,
    tick: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> WorkerResult<()> {
    tracing::info!(tick_secs = tick.as_secs_f64(), "Interval schedule started");

    let mut schedule = IntervalSchedule::starting_at(Instant::now());
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                return stop_or_cancel(changed, &shutdown, "interval schedule");
            }
        }

        interval_tick(&coordinator, &mut schedule, Instant::now()).await;
    }
}

/// One evaluation of the interval schedule at `now`
///
/// Returns `None` when no scan was due. Gating skips (busy queue, held lock)
/// leave the schedule untouched so the next tick retries; attempted scans
/// mark it even when a trigger failed.
pub async fn interval_tick(
    coordinator: &ScanCoordinator,
    schedule: &mut IntervalSchedule,
    now: Instant,
) -> Option<AutoScanOutcome> {
    let config = coordinator.media_server_config().await;
    if !config.interval_enabled {
        return None;
    }

    if !schedule.is_due(now, scan_interval(config.interval_seconds)) {
        return None;
    }

    let outcome = coordinator.interval_scan_outcome().await;
    if outcome.attempted() {
        schedule.mark(now);
    }
    match outcome {
        AutoScanOutcome::Triggered => tracing::info!("Interval scan completed"),
        AutoScanOutcome::Failed => tracing::warn!("Interval scan attempted with failures"),
        other => tracing::debug!(outcome = ?other, "Interval scan skipped, retrying next tick"),
    }
    Some(outcome)
}

fn stop_or_cancel(
    changed: Result<(), watch::error::RecvError>,
    shutdown: &watch::Receiver<bool>,
    job: &str,
) -> WorkerResult<()> {
    match changed {
        Ok(()) if *shutdown.borrow() => {
            tracing::info!(job, "Stopping on shutdown");
            Ok(())
        }
        Ok(()) => Err(WorkerError::Internal(format!(
            "{job} received a shutdown update without shutdown"
        ))),
        Err(_) => Err(WorkerError::Cancelled(format!(
            "{job} lost its shutdown channel"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use refresharr_media_scan::{
        DownloadTask, MediaServerClient, MemoryConfigStore, MemoryLockStore, MemoryTaskStore,
    };
    use refresharr_test_utils::MockJellyfinServer;
    use serde_json::json;

    fn coordinator(config: MemoryConfigStore, tasks: MemoryTaskStore) -> Arc<ScanCoordinator> {
        Arc::new(ScanCoordinator::new(
            Arc::new(config),
            Arc::new(tasks),
            Arc::new(MemoryLockStore::new()),
            MediaServerClient::new().unwrap(),
        ))
    }

    fn downloading() -> Vec<DownloadTask> {
        vec![DownloadTask::new("t1", "album", "downloading")]
    }

    async fn wait_for_requests(server: &MockJellyfinServer, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while server.request_count().await < count {
            assert!(Instant::now() < deadline, "timed out waiting for refresh");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[test]
    fn test_watcher_ignores_empty_queue_at_startup() {
        let mut watcher = QueueWatcher::new();
        assert!(!watcher.observe(true));
        assert!(!watcher.observe(true));
    }

    #[test]
    fn test_watcher_fires_once_per_drain() {
        let mut watcher = QueueWatcher::new();
        assert!(!watcher.observe(false));
        assert!(!watcher.observe(false));
        assert!(watcher.observe(true));
        assert!(!watcher.observe(true));

        assert!(!watcher.observe(false));
        assert!(watcher.observe(true));
    }

    #[test]
    fn test_schedule_first_due_after_one_interval() {
        let start = Instant::now();
        let mut schedule = IntervalSchedule::starting_at(start);
        let hour = Duration::from_secs(3600);

        assert!(!schedule.is_due(start, hour));
        assert!(!schedule.is_due(start + Duration::from_secs(3599), hour));
        assert!(schedule.is_due(start + hour, hour));

        schedule.mark(start + hour);
        assert!(!schedule.is_due(start + hour + Duration::from_secs(60), hour));
        assert!(schedule.is_due(start + hour * 2, hour));
    }

    #[test]
    fn test_scan_interval_clamps_to_minimum() {
        assert_eq!(scan_interval(3600), Duration::from_secs(3600));
        assert_eq!(scan_interval(10), Duration::from_secs(60));
        assert_eq!(scan_interval(-5), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_queue_watch_scans_when_queue_drains() {
        let jellyfin = MockJellyfinServer::start().await;
        jellyfin.mock_refresh_status(204, 1).await;

        let tasks = MemoryTaskStore::new(downloading());
        let config = MemoryConfigStore::new(json!({
            "mediaServers": {
                "jellyfin": { "enabled": true, "url": jellyfin.url(), "apiKey": jellyfin.api_key() },
                "triggerOnQueueEmpty": true
            }
        }));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_queue_watch(
            coordinator(config, tasks.clone()),
            Duration::from_millis(10),
            rx,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(jellyfin.request_count().await, 0);

        tasks.set_tasks(vec![DownloadTask::new("t1", "album", "complete")]);
        wait_for_requests(&jellyfin, 1).await;

        // Staying empty does not trigger again
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(jellyfin.request_count().await, 1);

        tx.send(true).unwrap();
        assert_matches!(handle.await.unwrap(), Ok(()));
    }

    fn interval_config(jellyfin: &MockJellyfinServer) -> MemoryConfigStore {
        MemoryConfigStore::new(json!({
            "mediaServers": {
                "jellyfin": { "enabled": true, "url": jellyfin.url(), "apiKey": jellyfin.api_key() },
                "intervalEnabled": true,
                "intervalSeconds": 3600
            }
        }))
    }

    /// A failed trigger still counts as this interval's scan
    #[tokio::test]
    async fn test_failed_interval_scan_marks_schedule() {
        let jellyfin = MockJellyfinServer::start().await;
        jellyfin.mock_refresh_status(500, 1).await;

        let coordinator = coordinator(interval_config(&jellyfin), MemoryTaskStore::default());
        let start = Instant::now();
        let mut schedule = IntervalSchedule::starting_at(start);
        let hour = Duration::from_secs(3600);

        let due_at = start + hour;
        let outcome = interval_tick(&coordinator, &mut schedule, due_at).await;
        assert_eq!(outcome, Some(AutoScanOutcome::Failed));

        // Next tick does not retry
        let next_tick = due_at + Duration::from_secs(60);
        assert!(!schedule.is_due(next_tick, hour));
        assert_eq!(interval_tick(&coordinator, &mut schedule, next_tick).await, None);
        assert_eq!(jellyfin.request_count().await, 1);
    }

    /// A busy queue leaves the schedule due so the next tick retries
    #[tokio::test]
    async fn test_skipped_interval_scan_retries_next_tick() {
        let jellyfin = MockJellyfinServer::start().await;
        jellyfin.mock_refresh_success().await;

        let tasks = MemoryTaskStore::new(downloading());
        let coordinator = coordinator(interval_config(&jellyfin), tasks.clone());
        let start = Instant::now();
        let mut schedule = IntervalSchedule::starting_at(start);

        let due_at = start + Duration::from_secs(3600);
        assert_eq!(
            interval_tick(&coordinator, &mut schedule, due_at).await,
            Some(AutoScanOutcome::QueueBusy)
        );
        assert_eq!(jellyfin.request_count().await, 0);

        tasks.set_tasks(vec![]);
        let next_tick = due_at + Duration::from_secs(60);
        assert_eq!(
            interval_tick(&coordinator, &mut schedule, next_tick).await,
            Some(AutoScanOutcome::Triggered)
        );
        assert_eq!(jellyfin.request_count().await, 1);
    }

    #[tokio::test]
    async fn test_interval_not_due_before_one_interval() {
        let jellyfin = MockJellyfinServer::start().await;
        jellyfin.expect_no_refresh().await;

        let coordinator = coordinator(interval_config(&jellyfin), MemoryTaskStore::default());
        let start = Instant::now();
        let mut schedule = IntervalSchedule::starting_at(start);

        let early = start + Duration::from_secs(3599);
        assert_eq!(interval_tick(&coordinator, &mut schedule, early).await, None);
    }

    #[tokio::test]
    async fn test_interval_schedule_stops_on_shutdown() {
        let jellyfin = MockJellyfinServer::start().await;
        jellyfin.expect_no_refresh().await;

        let config = MemoryConfigStore::new(json!({
            "mediaServers": {
                "jellyfin": { "enabled": true, "url": jellyfin.url(), "apiKey": jellyfin.api_key() },
                "intervalEnabled": true,
                "intervalSeconds": 60
            }
        }));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_interval_schedule(
            coordinator(config, MemoryTaskStore::default()),
            Duration::from_millis(10),
            rx,
        ));

        // Not yet one interval since start
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        assert_matches!(handle.await.unwrap(), Ok(()));
        assert_eq!(jellyfin.request_count().await, 0);
    }

    #[tokio::test]
    async fn test_dropped_shutdown_sender_cancels() {
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_queue_watch(
            coordinator(MemoryConfigStore::empty(), MemoryTaskStore::default()),
            Duration::from_millis(10),
            rx,
        ));

        drop(tx);
        assert_matches!(handle.await.unwrap(), Err(WorkerError::Cancelled(_)));
    }
}
