use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{PluginError, PluginResult};
use super::version::PluginVersion;

pub const PLUGIN_FILE_EXT: &str = "json";

/// How a plugin's commands are executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginRuntime {
    /// Compiled into the host, looked up by key.
    Builtin(String),
    /// External executable speaking the JSON stdio protocol.
    Process(ProcessSpec),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Human-facing plugin metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginMetadata {
    pub name: String,
    pub description: String,
    pub file_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    version: Option<PluginVersion>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    runtime: Option<PluginRuntime>,
    #[serde(default)]
    commands: Vec<String>,
    #[serde(default)]
    api: Map<String, Value>,
}

/// Contents of a plugin file (`<plugins>/<name>.json`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub version: PluginVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub runtime: PluginRuntime,
    /// Command names, only meaningful for process plugins.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
    /// Static capability contributions, only meaningful for process plugins.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub api: Map<String, Value>,
}

impl PluginDescriptor {
    pub fn builtin(key: impl Into<String>, id: impl Into<String>, version: PluginVersion) -> Self {
        Self {
            id: Some(id.into()),
            version,
            name: None,
            description: None,
            runtime: PluginRuntime::Builtin(key.into()),
            commands: Vec::new(),
            api: Map::new(),
        }
    }

    pub fn with_metadata(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.description = Some(description.into());
        self
    }

    /// Parse plugin file contents. A missing version or runtime is a load error.
    pub fn parse(plugin: &str, content: &str) -> PluginResult<Self> {
        let raw: RawDescriptor =
            serde_json::from_str(content).map_err(|e| PluginError::load(plugin, e.to_string()))?;

        let version = raw
            .version
            .ok_or_else(|| PluginError::load(plugin, "plugin declares no version"))?;
        let runtime = raw
            .runtime
            .ok_or_else(|| PluginError::load(plugin, "plugin declares no runtime"))?;
        let id = raw.id.filter(|id| !id.trim().is_empty());

        Ok(Self {
            id,
            version,
            name: raw.name,
            description: raw.description,
            runtime,
            commands: raw.commands,
            api: raw.api,
        })
    }

    pub fn load(path: &Path) -> PluginResult<Self> {
        let plugin = plugin_name_from_path(path).unwrap_or_default();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PluginError::load(&plugin, format!("{}: {e}", path.display())))?;
        Self::parse(&plugin, &content)
    }

    pub fn to_json(&self) -> PluginResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn metadata(&self, fallback_name: &str, path: &Path) -> PluginMetadata {
        PluginMetadata {
            name: self
                .name
                .clone()
                .unwrap_or_else(|| fallback_name.to_string()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| "No description.".to_string()),
            file_path: path.to_path_buf(),
        }
    }
}

pub fn plugin_file_name(name: &str) -> String {
    let stem = name
        .strip_suffix(&format!(".{PLUGIN_FILE_EXT}"))
        .unwrap_or(name);
    format!("{stem}.{PLUGIN_FILE_EXT}")
}

pub fn plugin_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(ToOwned::to_owned)
}

pub fn is_plugin_file(path: &Path) -> bool {
    path.is_file()
        && path.extension().is_some_and(|e| e == PLUGIN_FILE_EXT)
        && !path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("__") || n.starts_with('.'))
}
