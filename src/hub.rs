//! The host context: directories, settings and plugin machinery for one run.

use std::time::Duration;

use tracing::debug;

use crate::builtin;
use crate::client::Downloader;
use crate::config::{Settings, SettingsLoader};
use crate::paths::HubDirs;
use crate::plugins::{
    Api, ApiSurface, BuiltinRegistry, CommandInvocation, DispatchOutcome, Dispatcher, HOST_VERSION,
    PluginLoader, PluginStore,
};
use crate::{Error, Result};

/// Owns everything a dispatch borrows. The API object is built at most once
/// per `Hub`, on the first dispatch that reaches execution.
pub struct Hub {
    dirs: HubDirs,
    settings: Settings,
    store: PluginStore,
    loader: PluginLoader,
    api: ApiSurface,
}

impl Hub {
    /// Hub with the bundled builtin plugins.
    pub fn new(dirs: HubDirs, settings: Settings) -> Result<Self> {
        Self::with_builtins(dirs, settings, builtin::registry())
    }

    pub fn with_builtins(
        dirs: HubDirs,
        settings: Settings,
        builtins: BuiltinRegistry,
    ) -> Result<Self> {
        let downloader = Downloader::new(settings.request_timeout())?;
        let bundled = builtin::bundled_files(&builtins)?;
        let store = PluginStore::new(dirs.clone(), bundled, downloader.clone())
            .with_default_index(settings.default_index.clone());
        let core = Api::new(HOST_VERSION, dirs.clone(), store.clone(), downloader);
        let loader = PluginLoader::new(builtins, settings.plugin_timeout());

        debug!(
            builtins = loader.builtins().len(),
            debug = dirs.is_debug(),
            "hub ready"
        );
        Ok(Self {
            dirs,
            settings,
            store,
            loader,
            api: ApiSurface::new(core),
        })
    }

    /// Resolve directories from the environment and load settings from
    /// `HUB_*` variables and `<config>/settings.json`.
    pub async fn from_env(debug: bool) -> Result<Self> {
        let dirs = HubDirs::from_env(debug).map_err(Error::Directory)?;
        let settings_path = dirs.settings_path().map_err(Error::Directory)?;
        let settings = SettingsLoader::standard(&settings_path).load().await?;
        Self::new(dirs, settings)
    }

    pub fn dirs(&self) -> &HubDirs {
        &self.dirs
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &PluginStore {
        &self.store
    }

    pub fn plugin_timeout(&self) -> Duration {
        self.settings.plugin_timeout()
    }

    pub fn is_api_built(&self) -> bool {
        self.api.is_built()
    }

    pub fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(&self.dirs, &self.store, &self.loader, &self.api)
    }

    pub async fn invoke(&self, invocation: &CommandInvocation) -> Result<DispatchOutcome> {
        self.dispatcher().dispatch(invocation).await
    }
}
