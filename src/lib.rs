//! # mem-hub
//!
//! Plugin-driven note hub. A thin core resolves config and data directories,
//! keeps a manifest of plugin identities and dispatches `plugin:command`
//! invocations to plugins through a capability-passing [`plugins::Api`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mem_hub::{CommandInvocation, DispatchOutcome, Hub};
//!
//! # async fn example() -> Result<(), mem_hub::Error> {
//! let hub = Hub::from_env(false).await?;
//! let inv = CommandInvocation::new("mem:list", Vec::new());
//! match hub.invoke(&inv).await? {
//!     DispatchOutcome::Rendered(lines) => lines.iter().for_each(|l| println!("{l}")),
//!     DispatchOutcome::Failed(failure) => eprintln!("{}", failure.message()),
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod builtin;
pub mod client;
pub mod config;
pub mod hub;
pub mod observability;
pub mod paths;
pub mod plugins;
pub mod shell;

pub use client::Downloader;
pub use config::{ConfigError, Settings, SettingsLoader};
pub use hub::Hub;
pub use observability::{LogConfig, init_logging, install_panic_hook};
pub use paths::{DirRoots, HubDirs, InitOutcome, LoadOutcome};
pub use plugins::{
    Api, CommandInvocation, DispatchFailure, DispatchOutcome, ErrorKind, Output, Plugin,
    PluginError, PluginResult,
};
pub use shell::{Shell, ShellStatus};

/// Crate-level error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A config or data directory could not be resolved or created.
    #[error("Directory error: {0}")]
    Directory(#[source] std::io::Error),

    /// Plugin operation failed outside a dispatch.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Settings could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed core command.
    #[error("{0}")]
    Usage(String),
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad invocation by the user
    Usage,
    /// Settings or plugin files that cannot be used
    Configuration,
    /// Filesystem or network failures
    Environment,
}

impl Error {
    pub fn usage(message: impl Into<String>) -> Self {
        Error::Usage(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Usage(_) => ErrorCategory::Usage,
            Error::Config(_) => ErrorCategory::Configuration,
            Error::Plugin(e) => match e.kind() {
                ErrorKind::NotFound | ErrorKind::MissingIdentity => ErrorCategory::Usage,
                ErrorKind::VersionIncompatible | ErrorKind::Load => ErrorCategory::Configuration,
                _ => ErrorCategory::Environment,
            },
            Error::Directory(_) | Error::Io(_) => ErrorCategory::Environment,
        }
    }
}

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
