//! Worker configuration loaded from environment variables
//!
//! This module provides configuration management for the Refresharr worker.
//! Configuration is loaded from environment variables with sensible defaults
//! for development environments.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use refresharr_shared_config::{CommonConfig, Environment, RedisConfig, StorageConfig};

/// Worker configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with the API
    pub common: CommonConfig,

    /// How often the download queue is checked for draining, in seconds
    pub queue_poll_interval_secs: u64,

    /// How often the interval schedule is evaluated, in seconds
    pub interval_tick_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let common = CommonConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        let queue_poll_interval_secs: u64 = env::var("WORKER_QUEUE_POLL_INTERVAL")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("Invalid WORKER_QUEUE_POLL_INTERVAL value")?;

        let interval_tick_secs: u64 = env::var("WORKER_INTERVAL_TICK")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("Invalid WORKER_INTERVAL_TICK value")?;

        if queue_poll_interval_secs == 0 || interval_tick_secs == 0 {
            bail!("WORKER_QUEUE_POLL_INTERVAL and WORKER_INTERVAL_TICK must be positive");
        }

        Ok(Self {
            common,
            queue_poll_interval_secs,
            interval_tick_secs,
        })
    }

    pub fn queue_poll_interval(&self) -> Duration {
        Duration::from_secs(self.queue_poll_interval_secs)
    }

    pub fn interval_tick(&self) -> Duration {
        Duration::from_secs(self.interval_tick_secs)
    }

    /// Get Redis configuration
    pub fn redis(&self) -> &RedisConfig {
        &self.common.redis
    }

    /// Get settings document location
    pub fn storage(&self) -> &StorageConfig {
        &self.common.storage
    }

    /// Get environment mode
    pub fn environment(&self) -> Environment {
        self.common.environment
    }
}
