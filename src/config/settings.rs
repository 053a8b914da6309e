//! Host settings: `<config>/settings.json`, overridden by `HUB_*` variables.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::env::EnvConfigProvider;
use super::file::FileConfigProvider;
use super::provider::{ConfigProvider, ConfigProviderExt};
use super::{ConfigError, ConfigResult};
use crate::plugins::PluginIndex;
use crate::plugins::index::default_index;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PLUGIN_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Timeout for plugin downloads and repository fetches.
    pub request_timeout_secs: u64,
    /// Wall-clock limit for one process plugin command.
    pub plugin_timeout_secs: u64,
    /// Index written when a named install finds none.
    pub default_index: PluginIndex,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            plugin_timeout_secs: DEFAULT_PLUGIN_TIMEOUT_SECS,
            default_index: default_index(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn plugin_timeout(&self) -> Duration {
        Duration::from_secs(self.plugin_timeout_secs)
    }

    fn validate(&self) -> ConfigResult<()> {
        for (key, value) in [
            ("request_timeout_secs", self.request_timeout_secs),
            ("plugin_timeout_secs", self.plugin_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".into(),
                });
            }
        }
        Ok(())
    }
}

/// Resolves [`Settings`] from providers in priority order; the first
/// provider with a value for a key wins.
pub struct SettingsLoader {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Environment first, then `settings_path`.
    pub fn standard(settings_path: &Path) -> Self {
        Self::new()
            .provider(EnvConfigProvider::default())
            .provider(FileConfigProvider::new(settings_path))
    }

    pub fn provider(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    async fn lookup<T>(&self, key: &str) -> ConfigResult<Option<T>>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        for provider in &self.providers {
            if let Some(value) = provider.get::<T>(key).await? {
                debug!(%key, provider = provider.name(), "setting resolved");
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    pub async fn load(&self) -> ConfigResult<Settings> {
        let mut settings = Settings::default();

        if let Some(v) = self.lookup("request_timeout_secs").await? {
            settings.request_timeout_secs = v;
        }
        if let Some(v) = self.lookup("plugin_timeout_secs").await? {
            settings.plugin_timeout_secs = v;
        }
        if let Some(v) = self.lookup("default_index").await? {
            settings.default_index = v;
        }

        settings.validate()?;
        Ok(settings)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}
