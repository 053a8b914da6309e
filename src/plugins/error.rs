use std::path::PathBuf;

use super::version::PluginVersion;

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Plugin '{name}' not found.")]
    NotFound { name: String },

    #[error("Plugin '{plugin}' does not have the command `{command}`.")]
    CommandNotFound { plugin: String, command: String },

    #[error("Plugin '{plugin}' is missing its main entry point.")]
    MissingEntryPoint { plugin: String },

    #[error("Plugin '{name}' not found in index.")]
    IndexEntryNotFound { name: String },

    #[error("Default index file added at {}. Run the install again to use it.", path.display())]
    IndexSeeded { path: PathBuf },

    #[error("Plugin '{plugin}' does not declare an identity")]
    MissingIdentity { plugin: String },

    #[error(
        "Plugin '{plugin}' is version incompatible: plugin targets {plugin_version}, host is {host_version}"
    )]
    VersionIncompatible {
        plugin: String,
        plugin_version: PluginVersion,
        host_version: PluginVersion,
    },

    #[error("Failed to download plugin from {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Failed to load plugin '{plugin}': {reason}")]
    Load { plugin: String, reason: String },

    #[error("{0}")]
    Execution(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of [`PluginError`], used for exit codes and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    MissingIdentity,
    VersionIncompatible,
    Download,
    Io,
    Load,
    Execution,
}

impl PluginError {
    pub fn load(plugin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Load {
            plugin: plugin.into(),
            reason: reason.into(),
        }
    }

    pub fn download(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Download {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. }
            | Self::CommandNotFound { .. }
            | Self::MissingEntryPoint { .. }
            | Self::IndexEntryNotFound { .. }
            | Self::IndexSeeded { .. } => ErrorKind::NotFound,
            Self::MissingIdentity { .. } => ErrorKind::MissingIdentity,
            Self::VersionIncompatible { .. } => ErrorKind::VersionIncompatible,
            Self::Download { .. } => ErrorKind::Download,
            Self::Io(_) => ErrorKind::Io,
            Self::Load { .. } | Self::Json(_) => ErrorKind::Load,
            Self::Execution(_) => ErrorKind::Execution,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type PluginResult<T> = std::result::Result<T, PluginError>;
