//! Resolve, register, version-check, execute and render one invocation.

use std::fmt;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{Instrument, debug};

use super::api::ApiSurface;
use super::error::{ErrorKind, PluginError};
use super::loader::{LoadedPlugin, PluginLoader};
use super::namespace::CommandInvocation;
use super::registry::{ManifestRegistry, Registration};
use super::store::PluginStore;
use super::version::HOST_VERSION;
use crate::observability;
use crate::paths::HubDirs;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    Resolving,
    Registering,
    VersionChecking,
    Executing,
    Rendering,
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Resolving => "resolving",
            Self::Registering => "registering",
            Self::VersionChecking => "version-checking",
            Self::Executing => "executing",
            Self::Rendering => "rendering",
        };
        f.write_str(s)
    }
}

/// A plugin failure caught at the dispatch boundary.
#[derive(Debug)]
pub struct DispatchFailure {
    pub plugin: String,
    pub stage: DispatchStage,
    pub error: PluginError,
}

impl DispatchFailure {
    /// The single line reported to the user.
    ///
    /// Not-found, identity and version failures carry their own message;
    /// load, IO, download and execution errors are prefixed with the plugin
    /// name.
    pub fn message(&self) -> String {
        let self_describing = matches!(
            self.error.kind(),
            ErrorKind::NotFound | ErrorKind::MissingIdentity | ErrorKind::VersionIncompatible
        );
        if self_describing {
            self.error.to_string()
        } else {
            format!("Error executing plugin '{}': {}", self.plugin, self.error)
        }
    }
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Rendered(Vec<String>),
    Failed(DispatchFailure),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }
}

/// Borrows the hub's components for the duration of one invocation.
pub struct Dispatcher<'a> {
    dirs: &'a HubDirs,
    store: &'a PluginStore,
    loader: &'a PluginLoader,
    api: &'a ApiSurface,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        dirs: &'a HubDirs,
        store: &'a PluginStore,
        loader: &'a PluginLoader,
        api: &'a ApiSurface,
    ) -> Self {
        Self {
            dirs,
            store,
            loader,
            api,
        }
    }

    /// Run one invocation. Plugin failures come back as
    /// [`DispatchOutcome::Failed`]; only directory resolution errors are
    /// returned as `Err`.
    pub async fn dispatch(&self, invocation: &CommandInvocation) -> Result<DispatchOutcome> {
        let span = observability::dispatch_span(&invocation.plugin, &invocation.command);
        self.run(invocation).instrument(span).await
    }

    async fn run(&self, inv: &CommandInvocation) -> Result<DispatchOutcome> {
        let fail = |stage: DispatchStage, error: PluginError| -> Result<DispatchOutcome> {
            let failure = DispatchFailure {
                plugin: inv.plugin.clone(),
                stage,
                error,
            };
            debug!(stage = %failure.stage, error = %failure.error, "dispatch failed");
            Ok(DispatchOutcome::Failed(failure))
        };

        // Resolving
        if !self.store.ensure_present(&inv.plugin).map_err(Error::Directory)? {
            return fail(
                DispatchStage::Resolving,
                PluginError::NotFound {
                    name: inv.plugin.clone(),
                },
            );
        }
        let path = match self.store.plugin_path(&inv.plugin) {
            Ok(path) => path,
            Err(e) => return fail(DispatchStage::Resolving, e),
        };

        // Registering
        let manifest_path = self.dirs.manifest_path().map_err(Error::Directory)?;
        let plugin = match self.register(&path, &manifest_path) {
            Ok(plugin) => plugin,
            Err(e) => return fail(DispatchStage::Registering, e),
        };

        // VersionChecking
        if !plugin.version().is_compatible_with(&HOST_VERSION) {
            return fail(
                DispatchStage::VersionChecking,
                PluginError::VersionIncompatible {
                    plugin: inv.plugin.clone(),
                    plugin_version: plugin.version(),
                    host_version: HOST_VERSION,
                },
            );
        }

        // Executing
        if !plugin.has_command(&inv.command) {
            let error = if inv.implicit {
                PluginError::MissingEntryPoint {
                    plugin: inv.plugin.clone(),
                }
            } else {
                PluginError::CommandNotFound {
                    plugin: inv.plugin.clone(),
                    command: inv.command.clone(),
                }
            };
            return fail(DispatchStage::Executing, error);
        }

        let api = self.api.get_or_build(self.loader).map_err(Error::Directory)?;
        let call = plugin.handler().dispatch(&inv.command, api, &inv.args);
        let output = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return fail(DispatchStage::Executing, e),
            Err(payload) => {
                let message = observability::panic_payload_message(payload.as_ref())
                    .unwrap_or("plugin panicked")
                    .to_string();
                debug!(plugin = %inv.plugin, %message, "plugin panicked");
                return fail(DispatchStage::Executing, PluginError::execution(message));
            }
        };

        // Rendering
        Ok(DispatchOutcome::Rendered(output.render()))
    }

    fn register(
        &self,
        path: &std::path::Path,
        manifest_path: &std::path::Path,
    ) -> std::result::Result<LoadedPlugin, PluginError> {
        let plugin = self.loader.load(path)?;
        let mut manifest = ManifestRegistry::load(manifest_path)?;
        if manifest.register_if_new(&plugin)? == Registration::New {
            debug!(plugin = %plugin.name(), "first load of plugin");
        }
        Ok(plugin)
    }
}
