//! JSON file backed settings document

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::ConfigStore;
use crate::error::StoreResult;

/// Settings document stored as pretty-printed JSON on disk.
///
/// A missing file reads as an empty document. Saves go through a sibling
/// temporary file and a rename so readers never see a partial write.
#[derive(Debug, Clone)]
pub struct JsonFileConfigStore {
    path: PathBuf,
}

impl JsonFileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "config.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ConfigStore for JsonFileConfigStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn get_config(&self) -> StoreResult<Value> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Settings document not found, using empty document");
                return Ok(Value::Object(Map::new()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&contents)?)
    }

    #[instrument(skip(self, document), fields(path = %self.path.display()))]
    async fn save_config(&self, document: &Value) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_vec_pretty(document)?;
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, contents).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        debug!("Settings document saved");
        Ok(())
    }
}
