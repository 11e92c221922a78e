//! Redis backed task and lock stores
//!
//! The downloader keeps one JSON info blob per task under `task:{id}:info`
//! and appends status updates to the list `task:{id}:status`. The scan lock
//! is a plain string key written with `SET NX EX`.

use std::time::Duration;

use ::redis::aio::MultiplexedConnection;
use ::redis::Client;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{LockStore, TaskStore};
use crate::error::{StoreError, StoreResult};
use crate::tasks::DownloadTask;

const TASK_INFO_PATTERN: &str = "task:*:info";

/// Open a multiplexed connection, bounded by `timeout`
async fn connect(client: &Client, timeout: Duration) -> StoreResult<MultiplexedConnection> {
    tokio::time::timeout(timeout, client.get_multiplexed_async_connection())
        .await
        .map_err(|_| StoreError::Timeout("redis connection"))?
        .map_err(StoreError::from)
}

/// Scan lock store on Redis
#[derive(Clone)]
pub struct RedisLockStore {
    client: Client,
    connect_timeout: Duration,
}

impl RedisLockStore {
    pub fn new(client: Client, connect_timeout: Duration) -> Self {
        Self {
            client,
            connect_timeout,
        }
    }

    /// Build from a connection URL; fails only on a malformed URL
    pub fn open(url: &str, connect_timeout: Duration) -> StoreResult<Self> {
        Ok(Self::new(Client::open(url)?, connect_timeout))
    }
}

impl std::fmt::Debug for RedisLockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisLockStore")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    #[instrument(skip(self, value))]
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let mut conn = connect(&self.client, self.connect_timeout).await?;

        // SET NX replies OK when written and nil when the key exists
        let reply: Option<String> = ::redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;

        Ok(reply.is_some())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = connect(&self.client, self.connect_timeout).await?;
        let _: i64 = ::redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }
}

/// Download task records on Redis
#[derive(Clone)]
pub struct RedisTaskStore {
    client: Client,
    connect_timeout: Duration,
}

impl RedisTaskStore {
    pub fn new(client: Client, connect_timeout: Duration) -> Self {
        Self {
            client,
            connect_timeout,
        }
    }

    pub fn open(url: &str, connect_timeout: Duration) -> StoreResult<Self> {
        Ok(Self::new(Client::open(url)?, connect_timeout))
    }
}

impl std::fmt::Debug for RedisTaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisTaskStore")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[async_trait]
impl TaskStore for RedisTaskStore {
    #[instrument(skip(self))]
    async fn get_all_tasks(&self) -> StoreResult<Vec<DownloadTask>> {
        let mut conn = connect(&self.client, self.connect_timeout).await?;

        let keys: Vec<String> = ::redis::cmd("KEYS")
            .arg(TASK_INFO_PATTERN)
            .query_async(&mut conn)
            .await?;

        let mut tasks = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(task_id) = task_id_from_info_key(&key) else {
                continue;
            };

            let info: Option<String> =
                match ::redis::cmd("GET").arg(&key).query_async(&mut conn).await {
                    Ok(info) => info,
                    Err(e) if is_record_error(&e) => {
                        debug!(task_id, error = %e, "Skipping task with unreadable info");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };
            let Some(info) = info.and_then(|raw| serde_json::from_str::<Value>(&raw).ok()) else {
                debug!(task_id, "Skipping task with unreadable info");
                continue;
            };

            let last_status: Option<String> = match ::redis::cmd("LINDEX")
                .arg(format!("task:{}:status", task_id))
                .arg(-1)
                .query_async(&mut conn)
                .await
            {
                Ok(status) => status,
                Err(e) if is_record_error(&e) => {
                    debug!(task_id, error = %e, "Skipping task with unreadable status");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let status = last_status
                .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
                .map(|value| status_from_record(&value))
                .unwrap_or_else(|| "unknown".to_string());

            tasks.push(DownloadTask::new(
                task_id,
                &download_type_from_info(&info),
                &status,
            ));
        }

        Ok(tasks)
    }
}

/// Errors confined to one record (`WRONGTYPE`, unparsable reply). Connection
/// failures are not, since skipping them would read as a drained queue.
fn is_record_error(err: &::redis::RedisError) -> bool {
    !(err.is_io_error() || err.is_connection_dropped() || err.is_timeout())
}

/// `task:{id}:info` -> `{id}`
fn task_id_from_info_key(key: &str) -> Option<&str> {
    key.strip_prefix("task:")
        .and_then(|rest| rest.strip_suffix(":info"))
        .filter(|id| !id.is_empty())
}

/// `download_type`, falling back to the older `type` field
fn download_type_from_info(info: &Value) -> String {
    info.get("download_type")
        .or_else(|| info.get("type"))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}

/// Real-time downloads nest the status under `status_info`
fn status_from_record(record: &Value) -> String {
    record
        .get("status_info")
        .and_then(|info| info.get("status"))
        .or_else(|| record.get("status"))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}
