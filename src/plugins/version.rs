use std::fmt;

use serde::{Deserialize, Serialize};

/// Version of the running host. Plugins are gated against this at dispatch.
pub const HOST_VERSION: PluginVersion = PluginVersion::new(0, 4, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PluginVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Majors must match; on a `0.x` host the minor must match too.
    /// Patch is never compared.
    pub fn is_compatible_with(&self, host: &PluginVersion) -> bool {
        if self.major != host.major {
            return false;
        }
        host.major != 0 || self.minor == host.minor
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
