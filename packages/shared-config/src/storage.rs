//! Persisted settings document location

use std::path::PathBuf;

use crate::{get_env_or_default, ConfigError, ConfigResult};

/// Default location of the main settings document
pub const DEFAULT_CONFIG_PATH: &str = "./data/config/main.json";

/// Where the main JSON settings document lives on disk
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Path to the main settings document (holds the `mediaServers` section)
    pub config_path: PathBuf,
}

impl StorageConfig {
    /// Load storage configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let raw = get_env_or_default("CONFIG_PATH", DEFAULT_CONFIG_PATH);
        if raw.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "CONFIG_PATH".to_string(),
                "path cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            config_path: PathBuf::from(raw),
        })
    }

    /// Create a configuration pointing at a custom path (useful for testing)
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::with_path(DEFAULT_CONFIG_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path() {
        temp_env::with_var_unset("CONFIG_PATH", || {
            let config = StorageConfig::from_env().unwrap();
            assert_eq!(config.config_path, PathBuf::from(DEFAULT_CONFIG_PATH));
        });
    }

    #[test]
    fn test_custom_path() {
        temp_env::with_var("CONFIG_PATH", Some("/srv/refresharr/main.json"), || {
            let config = StorageConfig::from_env().unwrap();
            assert_eq!(
                config.config_path,
                PathBuf::from("/srv/refresharr/main.json")
            );
        });
    }

    #[test]
    fn test_empty_path_rejected() {
        temp_env::with_var("CONFIG_PATH", Some("  "), || {
            assert!(StorageConfig::from_env().is_err());
        });
    }
}
