//! Plugins compiled into the host.
//!
//! Each one is addressed by a builtin runtime key and ships a descriptor
//! that is written to the plugin directory when bundled plugins are synced.

mod hi;
mod info;
mod mem;
mod pkg;
mod repo;

pub use hi::HiPlugin;
pub use info::InfoPlugin;
pub use mem::MemPlugin;
pub use pkg::PkgPlugin;
pub use repo::{RepoFile, RepoInfo, RepoPlugin};

use crate::plugins::{BuiltinRegistry, BundledFile, PluginDescriptor, PluginResult};

/// Identity under which the `info` plugin contributes `describe`.
pub const INFO_ID: &str = "com.flench04.info";
pub const DESCRIBE_CAPABILITY: &str = "describe";

/// Registry with every bundled plugin.
pub fn registry() -> BuiltinRegistry {
    let mut registry = BuiltinRegistry::new();
    registry
        .register("hi", hi::descriptor(), HiPlugin)
        .register("info", info::descriptor(), InfoPlugin)
        .register("mem", mem::descriptor(), MemPlugin)
        .register("pkg", pkg::descriptor(), PkgPlugin)
        .register("repo", repo::descriptor(), RepoPlugin);
    registry
}

/// Plugin files for every descriptor in `registry`.
pub fn bundled_files(registry: &BuiltinRegistry) -> PluginResult<Vec<BundledFile>> {
    registry
        .descriptors()
        .map(|(name, descriptor)| {
            Ok(BundledFile {
                name: name.to_string(),
                contents: descriptor.to_json()?,
            })
        })
        .collect()
}

fn bundled(key: &str, id: &str, description: &str) -> PluginDescriptor {
    PluginDescriptor::builtin(key, id, crate::plugins::HOST_VERSION).with_metadata(key, description)
}

/// First argument, or `None` when absent or blank.
fn first_arg(args: &[String]) -> Option<&str> {
    args.first().map(String::as_str).filter(|s| !s.trim().is_empty())
}
