//! Locally cached plugin index: `<config>/pkg/index.json`.
//!
//! Maps a plugin name to where it can be downloaded. The index is maintained
//! by the `repo` plugin and read by named installs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::PluginResult;

pub const INDEX_DIR: &str = "pkg";
pub const INDEX_FILE: &str = "index.json";

/// Seed entry for `hi`. This location is a placeholder; deployments point it
/// at their own plugin host through the `default_index` setting.
pub const DEFAULT_HI_URL: &str =
    "https://raw.githubusercontent.com/Fleench/mem-note/refs/heads/main/plugins/hi.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IndexEntry {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            extra: Map::new(),
        }
    }
}

pub type PluginIndex = BTreeMap<String, IndexEntry>;

/// Index seeded when none exists yet.
pub fn default_index() -> PluginIndex {
    BTreeMap::from([("hi".to_string(), IndexEntry::with_url(DEFAULT_HI_URL))])
}

pub fn index_path(config_dir: &Path) -> PathBuf {
    config_dir.join(INDEX_DIR).join(INDEX_FILE)
}

pub fn load_index(path: &Path) -> PluginResult<Option<PluginIndex>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

pub fn save_index(path: &Path, index: &PluginIndex) -> PluginResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_vec_pretty(index)?)?;
    Ok(())
}
