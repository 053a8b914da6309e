//! Configuration providers and host settings.
//!
//! ```rust,no_run
//! use mem_hub::config::SettingsLoader;
//!
//! # async fn example() -> Result<(), mem_hub::config::ConfigError> {
//! let settings = SettingsLoader::standard("/home/me/.config/hub/settings.json".as_ref())
//!     .load()
//!     .await?;
//! println!("{}s", settings.request_timeout_secs);
//! # Ok(())
//! # }
//! ```

pub mod env;
pub mod file;
pub mod provider;
pub mod settings;

pub use env::EnvConfigProvider;
pub use file::FileConfigProvider;
pub use provider::{ConfigProvider, ConfigProviderExt};
pub use settings::{Settings, SettingsLoader};

use thiserror::Error;

/// Errors that can occur in configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// The key with invalid value
        key: String,
        /// Error message
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment error: {0}")]
    Env(#[from] std::env::VarError),
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
