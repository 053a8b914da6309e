//! The capability object handed to every plugin command.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::discovery;
use super::error::{PluginError, PluginResult};
use super::loader::PluginLoader;
use super::output::Output;
use super::store::PluginStore;
use super::version::PluginVersion;
use crate::client::Downloader;
use crate::paths::HubDirs;

pub type CapabilityFn = Arc<dyn Fn(&[String]) -> PluginResult<Output> + Send + Sync>;

/// A single value or callable a plugin offers to others.
#[derive(Clone)]
pub enum Capability {
    Value(Value),
    Function(CapabilityFn),
}

impl Capability {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&[String]) -> PluginResult<Output> + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    /// Invoke a callable capability. Calling a value capability is an error.
    pub fn call(&self, args: &[String]) -> PluginResult<Output> {
        match self {
            Self::Function(f) => f(args),
            Self::Value(_) => Err(PluginError::execution("capability is not callable")),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Function(_) => None,
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

pub type Capabilities = BTreeMap<String, Capability>;

/// Host accessors plus every plugin's contributed capabilities, keyed by
/// plugin identity.
///
/// Directory accessors are recomputed on each call so `init` and `load`
/// take effect within an interactive session.
#[derive(Debug, Clone)]
pub struct Api {
    host_version: PluginVersion,
    dirs: HubDirs,
    store: PluginStore,
    downloader: Downloader,
    plugins: BTreeMap<String, Capabilities>,
}

impl Api {
    pub fn new(
        host_version: PluginVersion,
        dirs: HubDirs,
        store: PluginStore,
        downloader: Downloader,
    ) -> Self {
        Self {
            host_version,
            dirs,
            store,
            downloader,
            plugins: BTreeMap::new(),
        }
    }

    pub fn host_version(&self) -> PluginVersion {
        self.host_version
    }

    /// Shared data directory (override or OS default).
    pub fn data_dir(&self) -> io::Result<PathBuf> {
        self.dirs.shared_data_dir()
    }

    /// Project-local data directory when initialized, otherwise shared.
    pub fn local_data_dir(&self) -> io::Result<PathBuf> {
        self.dirs.scoped_data_dir()
    }

    pub fn config_dir(&self) -> io::Result<PathBuf> {
        self.dirs.config_dir()
    }

    pub fn plugins_dir(&self) -> io::Result<PathBuf> {
        self.dirs.plugins_dir()
    }

    pub fn cwd(&self) -> &Path {
        self.dirs.cwd()
    }

    pub fn store(&self) -> &PluginStore {
        &self.store
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// Merge `caps` under `id`. Later contributions for the same key win.
    pub fn contribute(&mut self, id: impl Into<String>, caps: Capabilities) {
        self.plugins.entry(id.into()).or_default().extend(caps);
    }

    pub fn contributions(&self, id: &str) -> Option<&Capabilities> {
        self.plugins.get(id)
    }

    pub fn contributors(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    pub fn capability(&self, id: &str, name: &str) -> Option<&Capability> {
        self.plugins.get(id)?.get(name)
    }

    /// Call capability `name` contributed by plugin `id`.
    pub fn call(&self, id: &str, name: &str, args: &[String]) -> PluginResult<Output> {
        let capability = self.capability(id, name).ok_or_else(|| {
            PluginError::execution(format!("Capability '{name}' of '{id}' is not available."))
        })?;
        capability.call(args)
    }

    /// JSON view handed to process plugins: host version, directories and
    /// value capabilities. Callables cannot cross the process boundary.
    pub fn snapshot(&self) -> PluginResult<Value> {
        let mut plugins = Map::new();
        for (id, caps) in &self.plugins {
            let values: Map<String, Value> = caps
                .iter()
                .filter_map(|(k, c)| c.as_value().map(|v| (k.clone(), v.clone())))
                .collect();
            if !values.is_empty() {
                plugins.insert(id.clone(), Value::Object(values));
            }
        }

        Ok(json!({
            "version": {
                "major": self.host_version.major,
                "minor": self.host_version.minor,
                "patch": self.host_version.patch,
            },
            "data_dir": self.data_dir()?,
            "local_data_dir": self.local_data_dir()?,
            "config_dir": self.config_dir()?,
            "plugins": plugins,
        }))
    }
}

/// Builds the [`Api`] once per run, on first use.
#[derive(Debug)]
pub struct ApiSurface {
    core: Api,
    built: OnceLock<Api>,
}

impl ApiSurface {
    pub fn new(core: Api) -> Self {
        Self {
            core,
            built: OnceLock::new(),
        }
    }

    pub fn is_built(&self) -> bool {
        self.built.get().is_some()
    }

    /// Return the memoized API, building it on the first call by loading every
    /// plugin file and merging the contributions of those with an identity.
    pub fn get_or_build(&self, loader: &PluginLoader) -> io::Result<&Api> {
        if let Some(api) = self.built.get() {
            return Ok(api);
        }
        let api = self.build(loader)?;
        Ok(self.built.get_or_init(|| api))
    }

    fn build(&self, loader: &PluginLoader) -> io::Result<Api> {
        let mut api = self.core.clone();

        for path in discovery::plugin_files(&self.core.plugins_dir()?)? {
            let plugin = match loader.load(&path) {
                Ok(plugin) => plugin,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping plugin while building api");
                    continue;
                }
            };
            let Some(id) = plugin.id() else {
                continue;
            };
            if let Some(caps) = plugin.handler().contribute_api(&self.core) {
                debug!(plugin = %plugin.name(), %id, count = caps.len(), "merged plugin capabilities");
                api.contribute(id, caps);
            }
        }

        Ok(api)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DEFAULT_TIMEOUT;
    use crate::paths::DirRoots;
    use crate::plugins::descriptor::PluginDescriptor;
    use crate::plugins::runtime::{BuiltinRegistry, Plugin};
    use crate::plugins::version::HOST_VERSION;
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::{TempDir, tempdir};

    struct Shouter;

    #[async_trait]
    impl Plugin for Shouter {
        fn commands(&self) -> Vec<String> {
            vec!["main".into()]
        }

        fn contribute_api(&self, _core: &Api) -> Option<Capabilities> {
            Some(Capabilities::from([(
                "shout".to_string(),
                Capability::function(|args| Ok(Output::text(args.join(" ").to_uppercase()))),
            )]))
        }

        async fn dispatch(&self, _: &str, _: &Api, _: &[String]) -> PluginResult<Output> {
            Ok(Output::Empty)
        }
    }

    struct Quiet;

    #[async_trait]
    impl Plugin for Quiet {
        fn commands(&self) -> Vec<String> {
            vec!["main".into()]
        }

        async fn dispatch(&self, _: &str, _: &Api, _: &[String]) -> PluginResult<Output> {
            Ok(Output::Empty)
        }
    }

    fn core(tmp: &TempDir) -> Api {
        let dirs = HubDirs::new(
            DirRoots::new(tmp.path().join("config"), tmp.path().join("data")),
            tmp.path(),
            false,
        );
        let downloader = Downloader::new(DEFAULT_TIMEOUT).unwrap();
        let store = PluginStore::new(dirs.clone(), Vec::new(), downloader.clone());
        Api::new(HOST_VERSION, dirs, store, downloader)
    }

    fn loader() -> PluginLoader {
        let mut builtins = BuiltinRegistry::new();
        builtins
            .register("shouter", PluginDescriptor::builtin("shouter", "t.shouter", HOST_VERSION), Shouter)
            .register("quiet", PluginDescriptor::builtin("quiet", "t.quiet", HOST_VERSION), Quiet);
        PluginLoader::new(builtins, Duration::from_secs(5))
    }

    fn write_plugin(api: &Api, name: &str, body: &str) {
        std::fs::write(api.plugins_dir().unwrap().join(format!("{name}.json")), body).unwrap();
    }

    #[test]
    fn test_core_accessors() {
        let tmp = tempdir().unwrap();
        let api = core(&tmp);
        assert_eq!(api.host_version(), HOST_VERSION);
        assert!(api.config_dir().unwrap().is_dir());
        assert_eq!(api.data_dir().unwrap(), api.local_data_dir().unwrap());
    }

    #[test]
    fn test_build_merges_identified_contributions_only() {
        let tmp = tempdir().unwrap();
        let api = core(&tmp);
        write_plugin(
            &api,
            "shouter",
            r#"{"id":"t.shouter","version":{"major":0,"minor":4,"patch":0},"runtime":{"builtin":"shouter"}}"#,
        );
        write_plugin(
            &api,
            "anon",
            r#"{"version":{"major":0,"minor":4,"patch":0},"runtime":{"builtin":"shouter"}}"#,
        );
        write_plugin(
            &api,
            "quiet",
            r#"{"id":"t.quiet","version":{"major":0,"minor":4,"patch":0},"runtime":{"builtin":"quiet"}}"#,
        );
        write_plugin(&api, "broken", "not json");

        let surface = ApiSurface::new(api);
        let built = surface.get_or_build(&loader()).unwrap();

        assert_eq!(built.contributors().collect::<Vec<_>>(), vec!["t.shouter"]);
        let out = built
            .call("t.shouter", "shout", &["hi".into(), "there".into()])
            .unwrap();
        assert_eq!(out, Output::text("HI THERE"));
    }

    #[test]
    fn test_built_once_per_surface() {
        let tmp = tempdir().unwrap();
        let api = core(&tmp);
        let plugins_dir = api.plugins_dir().unwrap();
        let surface = ApiSurface::new(api);
        let loader = loader();

        assert!(!surface.is_built());
        let first = surface.get_or_build(&loader).unwrap();
        assert!(first.contributors().next().is_none());

        std::fs::write(
            plugins_dir.join("shouter.json"),
            r#"{"id":"t.shouter","version":{"major":0,"minor":4,"patch":0},"runtime":{"builtin":"shouter"}}"#,
        )
        .unwrap();
        let second = surface.get_or_build(&loader).unwrap();
        assert!(second.contributors().next().is_none());
        assert!(surface.is_built());
    }

    #[test]
    fn test_missing_capability_is_execution_error() {
        let tmp = tempdir().unwrap();
        let api = core(&tmp);
        let err = api.call("nobody", "nothing", &[]).unwrap_err();
        assert!(matches!(err, PluginError::Execution(_)));
    }

    #[test]
    fn test_snapshot_keeps_values_only() {
        let tmp = tempdir().unwrap();
        let mut api = core(&tmp);
        api.contribute(
            "t.ext",
            Capabilities::from([
                ("endpoint".to_string(), Capability::Value(json!("https://example.org"))),
                ("run".to_string(), Capability::function(|_| Ok(Output::Empty))),
            ]),
        );

        let snap = api.snapshot().unwrap();
        assert_eq!(snap["version"]["minor"], 4);
        assert_eq!(snap["plugins"]["t.ext"]["endpoint"], "https://example.org");
        assert!(snap["plugins"]["t.ext"].get("run").is_none());
        assert!(snap["config_dir"].as_str().unwrap().ends_with("hub"));
    }
}
