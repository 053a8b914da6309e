//! Logging setup and structured spans.
//!
//! Logs go to stderr so plugin output on stdout stays clean. The level comes
//! from `--log-level` / `HUB_LOG` and defaults to `warn`; `RUST_LOG`
//! directives still apply on top.

mod spans;

pub use spans::{dispatch_span, install_span};

use std::any::Any;

use tracing::error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            with_target: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to init logging: {0}")]
pub struct LogInitError(String);

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), LogInitError> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.with_target)
        .without_time();

    tracing_subscriber::registry()
        .with(config.filter())
        .with(fmt_layer)
        .try_init()
        .map_err(|e| LogInitError(e.to_string()))
}

/// Replace the default panic hook, which writes a multi-line report and a
/// backtrace hint to stderr, with a single `tracing` event. Plugin panics are
/// still caught by the dispatcher and reported as one failure line.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let message = panic_payload_message(info.payload()).unwrap_or("unknown panic");
        match info.location() {
            Some(location) => error!(%location, "panicked: {message}"),
            None => error!("panicked: {message}"),
        }
    }));
}

/// Text of a `panic!` payload, when it carries one.
pub fn panic_payload_message(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}
