//! File-based Configuration Provider
//!
//! Reads a JSON object from `settings.json`. A missing file is an empty
//! configuration.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::sync::OnceCell;

use super::provider::ConfigProvider;
use super::{ConfigError, ConfigResult};

pub struct FileConfigProvider {
    path: PathBuf,
    data: OnceCell<Map<String, Value>>,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> ConfigResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(ConfigError::InvalidValue {
                key: self.path.display().to_string(),
                message: "settings file must contain a JSON object".into(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl ConfigProvider for FileConfigProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        let map = self.data.get_or_try_init(|| self.load()).await?;

        // Support nested keys with dot notation
        let mut parts = key.split('.');
        let mut current = parts.next().and_then(|first| map.get(first));
        for part in parts {
            current = current.and_then(|v| v.get(part));
        }

        // Raw values are JSON text, parsed by `ConfigProviderExt::get`
        Ok(current.map(Value::to_string))
    }
}
