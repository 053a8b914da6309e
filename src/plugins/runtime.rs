use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::api::{Api, Capabilities};
use super::descriptor::PluginDescriptor;
use super::error::PluginResult;
use super::output::Output;

/// Uniform interface every plugin runtime implements.
///
/// `dispatch` is only called with a command that appears in `commands()`;
/// the dispatcher checks membership first.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn commands(&self) -> Vec<String>;

    /// Capabilities offered to other plugins, keyed under this plugin's identity.
    fn contribute_api(&self, _core: &Api) -> Option<Capabilities> {
        None
    }

    async fn dispatch(&self, command: &str, api: &Api, args: &[String]) -> PluginResult<Output>;
}

#[derive(Clone)]
struct BuiltinEntry {
    descriptor: PluginDescriptor,
    plugin: Arc<dyn Plugin>,
}

/// Plugins compiled into the host, addressed by their runtime key.
///
/// Each entry also carries the descriptor written to the plugin directory
/// when bundled plugins are synced.
#[derive(Clone, Default)]
pub struct BuiltinRegistry {
    entries: BTreeMap<String, BuiltinEntry>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: Plugin + 'static>(
        &mut self,
        key: impl Into<String>,
        descriptor: PluginDescriptor,
        plugin: P,
    ) -> &mut Self {
        self.entries.insert(
            key.into(),
            BuiltinEntry {
                descriptor,
                plugin: Arc::new(plugin),
            },
        );
        self
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Plugin>> {
        self.entries.get(key).map(|e| Arc::clone(&e.plugin))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// `(file stem, descriptor)` pairs for every bundled plugin.
    pub fn descriptors(&self) -> impl Iterator<Item = (&str, &PluginDescriptor)> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.as_str(), &entry.descriptor))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for BuiltinRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
