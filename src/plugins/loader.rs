use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::descriptor::{PluginDescriptor, PluginMetadata, PluginRuntime, plugin_name_from_path};
use super::error::{PluginError, PluginResult};
use super::process::ProcessPlugin;
use super::runtime::{BuiltinRegistry, Plugin};
use super::version::PluginVersion;

/// A plugin file resolved to a runnable handler with its command table.
#[derive(Clone)]
pub struct LoadedPlugin {
    name: String,
    path: PathBuf,
    descriptor: PluginDescriptor,
    handler: Arc<dyn Plugin>,
    commands: BTreeSet<String>,
}

impl LoadedPlugin {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn id(&self) -> Option<&str> {
        self.descriptor.id.as_deref()
    }

    pub fn version(&self) -> PluginVersion {
        self.descriptor.version
    }

    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    pub fn metadata(&self) -> PluginMetadata {
        self.descriptor.metadata(&self.name, &self.path)
    }

    pub fn handler(&self) -> &Arc<dyn Plugin> {
        &self.handler
    }

    pub fn commands(&self) -> &BTreeSet<String> {
        &self.commands
    }

    pub fn has_command(&self, command: &str) -> bool {
        self.commands.contains(command)
    }
}

impl std::fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("id", &self.descriptor.id)
            .field("commands", &self.commands)
            .finish()
    }
}

/// Turns plugin files into [`LoadedPlugin`]s.
#[derive(Clone, Debug)]
pub struct PluginLoader {
    builtins: BuiltinRegistry,
    process_timeout: Duration,
}

impl PluginLoader {
    pub fn new(builtins: BuiltinRegistry, process_timeout: Duration) -> Self {
        Self {
            builtins,
            process_timeout,
        }
    }

    pub fn builtins(&self) -> &BuiltinRegistry {
        &self.builtins
    }

    pub fn load(&self, path: &Path) -> PluginResult<LoadedPlugin> {
        let name = plugin_name_from_path(path).unwrap_or_default();
        let descriptor = PluginDescriptor::load(path)?;

        let handler: Arc<dyn Plugin> = match &descriptor.runtime {
            PluginRuntime::Builtin(key) => self
                .builtins
                .get(key)
                .ok_or_else(|| PluginError::load(&name, format!("unknown builtin runtime '{key}'")))?,
            PluginRuntime::Process(spec) => {
                let base = path.parent().unwrap_or_else(|| Path::new("."));
                let program = resolve_program(&spec.command, base);
                Arc::new(ProcessPlugin::new(
                    &name,
                    program,
                    spec.args.clone(),
                    &descriptor,
                    self.process_timeout,
                ))
            }
        };

        let commands: BTreeSet<String> = handler.commands().into_iter().collect();
        debug!(plugin = %name, id = ?descriptor.id, commands = commands.len(), "loaded plugin");

        Ok(LoadedPlugin {
            name,
            path: path.to_path_buf(),
            descriptor,
            handler,
            commands,
        })
    }
}

/// Relative program paths are resolved against the plugin directory; bare
/// names are left for `PATH` lookup.
fn resolve_program(command: &str, base: &Path) -> PathBuf {
    let candidate = Path::new(command);
    if candidate.is_absolute() {
        return candidate.to_path_buf();
    }
    let bare = candidate.components().count() == 1;
    if bare && !base.join(candidate).exists() {
        return candidate.to_path_buf();
    }
    base.join(candidate)
}
