//! Redis configuration types

use std::time::Duration;

use crate::{get_env_or_default, parse_env, ConfigResult};

/// Redis configuration
///
/// Redis backs both the download task records and the scan lock.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,

    /// Optional password for Redis authentication
    pub password: Option<String>,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl RedisConfig {
    /// Load Redis configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            url: get_env_or_default("REDIS_URL", "redis://localhost:6379"),
            password: std::env::var("REDIS_PASSWORD").ok().filter(|s| !s.is_empty()),
            connect_timeout_secs: parse_env("REDIS_CONNECT_TIMEOUT", 5)?,
        })
    }

    /// Create a configuration with a custom URL (useful for testing)
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            password: None,
            connect_timeout_secs: 5,
        }
    }

    /// Build the full connection URL including password if set
    ///
    /// A URL that already carries credentials is returned unchanged.
    pub fn connection_url(&self) -> String {
        if let Some(ref password) = self.password {
            if let Some(at_pos) = self.url.find("://") {
                let (scheme, rest) = self.url.split_at(at_pos + 3);
                if !rest.contains('@') {
                    return format!("{}:{}@{}", scheme, password, rest);
                }
            }
        }
        self.url.clone()
    }

    /// Connection timeout as a [`Duration`]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::with_url("redis://localhost:6379")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RedisConfig::default();
        assert_eq!(config.url, "redis://localhost:6379");
        assert!(config.password.is_none());
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_with_url() {
        let config = RedisConfig::with_url("redis://custom:6380");
        assert_eq!(config.url, "redis://custom:6380");
    }

    #[test]
    fn test_connection_url_no_password() {
        let config = RedisConfig::default();
        assert_eq!(config.connection_url(), "redis://localhost:6379");
    }

    #[test]
    fn test_connection_url_with_password() {
        let mut config = RedisConfig::with_url("redis://redis:6379/0");
        config.password = Some("s3cret".to_string());
        assert_eq!(config.connection_url(), "redis://:s3cret@redis:6379/0");
    }

    #[test]
    fn test_connection_url_keeps_embedded_credentials() {
        let mut config = RedisConfig::with_url("redis://:other@redis:6379");
        config.password = Some("s3cret".to_string());
        assert_eq!(config.connection_url(), "redis://:other@redis:6379");
    }
}
