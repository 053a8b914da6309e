//! Plugin registry and dispatch core.
//!
//! A plugin is a JSON file in the config directory's `plugins/` folder. It
//! names an identity, the host version it targets and a runtime: either a
//! builtin compiled into the host or an external process.
//!
//! ```text
//! <config>/
//! ├── manifest.json          identity -> settings, grows on first load
//! ├── pkg/index.json         name -> download url
//! └── plugins/
//!     ├── mem.json           {"id": "com.flench04.mem", "runtime": {"builtin": "mem"}, ...}
//!     └── ext.json           {"runtime": {"process": {"command": "./ext.sh"}}, ...}
//! ```
//!
//! Commands are addressed as `plugin:command`; a bare `plugin` runs `main`.

pub mod api;
mod descriptor;
mod discovery;
pub mod dispatcher;
mod error;
pub mod index;
mod loader;
pub mod namespace;
mod output;
mod process;
mod registry;
mod runtime;
pub mod store;
mod version;

pub use api::{Api, ApiSurface, Capabilities, Capability, CapabilityFn};
pub use descriptor::{
    PLUGIN_FILE_EXT, PluginDescriptor, PluginMetadata, PluginRuntime, ProcessSpec,
    is_plugin_file, plugin_file_name, plugin_name_from_path,
};
pub use discovery::plugin_files;
pub use dispatcher::{DispatchFailure, DispatchOutcome, DispatchStage, Dispatcher};
pub use error::{ErrorKind, PluginError, PluginResult};
pub use index::{IndexEntry, PluginIndex};
pub use loader::{LoadedPlugin, PluginLoader};
pub use namespace::CommandInvocation;
pub use output::Output;
pub use process::ProcessPlugin;
pub use registry::{ManifestRegistry, Registration};
pub use runtime::{BuiltinRegistry, Plugin};
pub use store::{BundledFile, Installed, PluginStore, SyncReport};
pub use version::{HOST_VERSION, PluginVersion};
