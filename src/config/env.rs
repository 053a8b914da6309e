//! Environment variable settings.
//!
//! Read-only view of `HUB_*` variables. A key maps to a variable name by
//! upper-casing and replacing `.` with `_`: `request_timeout_secs` is read
//! from `HUB_REQUEST_TIMEOUT_SECS`.

use super::provider::ConfigProvider;
use super::{ConfigError, ConfigResult};

pub const DEFAULT_ENV_PREFIX: &str = "HUB_";

#[derive(Debug, Clone)]
pub struct EnvConfigProvider {
    prefix: String,
}

impl EnvConfigProvider {
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn var_name(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.to_uppercase().replace('.', "_"))
    }
}

impl Default for EnvConfigProvider {
    fn default() -> Self {
        Self::prefixed(DEFAULT_ENV_PREFIX)
    }
}

#[async_trait::async_trait]
impl ConfigProvider for EnvConfigProvider {
    fn name(&self) -> &str {
        "env"
    }

    /// Unset and empty variables both count as absent.
    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        match std::env::var(self.var_name(key)) {
            Ok(value) => Ok(Some(value).filter(|v| !v.is_empty())),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(ConfigError::Env(e)),
        }
    }
}
