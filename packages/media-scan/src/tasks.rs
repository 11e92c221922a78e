//! Download task records and queue-emptiness detection
//!
//! Task stores hand back raw status strings written by the downloader over
//! several releases (`"downloading"`, `"real-time"`, `"ERROR_RETRIED"`, ...).
//! They are normalized once into [`TaskStatus`] here so the rest of the crate
//! matches on a single enum.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Canonical task status
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Initializing,
    Processing,
    Downloading,
    Progress,
    TrackProgress,
    RealTime,
    Retrying,
    Queued,
    Pending,
    Complete,
    Done,
    Error,
    Cancelled,
    Skipped,
    ErrorRetried,
    ErrorAutoCleaned,
    /// Any status this crate does not know about; treated as terminal
    Unknown(String),
}

impl TaskStatus {
    /// Normalize a raw status string (case-insensitive, `-` and `_` equivalent)
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "initializing" => Self::Initializing,
            "processing" => Self::Processing,
            "downloading" => Self::Downloading,
            "progress" => Self::Progress,
            "track_progress" => Self::TrackProgress,
            "real_time" | "realtime" => Self::RealTime,
            "retrying" => Self::Retrying,
            "queued" => Self::Queued,
            "pending" => Self::Pending,
            "complete" => Self::Complete,
            "done" => Self::Done,
            "error" => Self::Error,
            "cancelled" | "canceled" => Self::Cancelled,
            "skipped" => Self::Skipped,
            "error_retried" => Self::ErrorRetried,
            "error_auto_cleaned" => Self::ErrorAutoCleaned,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    /// Whether a task in this status may still produce files.
    ///
    /// Only known in-flight statuses count; unrecognized values are treated
    /// as terminal so a stray status can never block scans forever.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Initializing
                | Self::Processing
                | Self::Downloading
                | Self::Progress
                | Self::TrackProgress
                | Self::RealTime
                | Self::Retrying
                | Self::Queued
                | Self::Pending
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Initializing => "initializing",
            Self::Processing => "processing",
            Self::Downloading => "downloading",
            Self::Progress => "progress",
            Self::TrackProgress => "track_progress",
            Self::RealTime => "real_time",
            Self::Retrying => "retrying",
            Self::Queued => "queued",
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::Done => "done",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
            Self::Skipped => "skipped",
            Self::ErrorRetried => "error_retried",
            Self::ErrorAutoCleaned => "error_auto_cleaned",
            Self::Unknown(raw) => raw.as_str(),
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of work a task performs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DownloadType {
    Track,
    Album,
    Playlist,
    /// Utility and maintenance tasks; irrelevant for scan gating
    Other(String),
}

impl DownloadType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "track" => Self::Track,
            "album" => Self::Album,
            "playlist" => Self::Playlist,
            _ => Self::Other(raw.to_string()),
        }
    }

    /// Whether tasks of this kind write into the media library
    pub fn is_download(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Track => "track",
            Self::Album => "album",
            Self::Playlist => "playlist",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for DownloadType {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<DownloadType> for String {
    fn from(kind: DownloadType) -> Self {
        kind.as_str().to_string()
    }
}

/// A task record as exposed by the task store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTask {
    pub task_id: String,
    pub download_type: DownloadType,
    pub status: TaskStatus,
}

impl DownloadTask {
    pub fn new(task_id: impl Into<String>, download_type: &str, status: &str) -> Self {
        Self {
            task_id: task_id.into(),
            download_type: DownloadType::parse(download_type),
            status: TaskStatus::parse(status),
        }
    }
}

/// Whether the download queue has drained.
///
/// Only track, album and playlist tasks are considered. With none present
/// the queue is empty; otherwise it is empty once no such task is active.
pub fn queue_is_empty(tasks: &[DownloadTask]) -> bool {
    let downloads: Vec<&DownloadTask> = tasks
        .iter()
        .filter(|t| t.download_type.is_download())
        .collect();

    if downloads.is_empty() {
        debug!("No download tasks present, queue is empty");
        return true;
    }

    let active: Vec<&DownloadTask> = downloads
        .iter()
        .copied()
        .filter(|t| t.status.is_active())
        .collect();

    if !active.is_empty() {
        debug!(
            active = active.len(),
            first_task = %active[0].task_id,
            first_status = %active[0].status,
            "Download tasks still active, queue is not empty"
        );
        return false;
    }

    debug!(
        tasks = downloads.len(),
        "All download tasks are terminal, queue is empty"
    );
    true
}
