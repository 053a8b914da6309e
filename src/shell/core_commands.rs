//! Reserved top-level commands handled by the host itself.

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::hub::Hub;
use crate::paths::LOAD_DEFAULT;
use crate::{Error, Result};

pub const HELP: [&str; 8] = [
    "Usage: hub <plugin>[:<command>] [args...]",
    "A bare <plugin> runs its `main` command.",
    "Core commands:",
    "  init                                - Keep notes in ./.mem for this directory",
    "  load <path|default>                 - Set or clear the shared data directory",
    "  reset <config|data|bundled-plugins> - Wipe config, data or bundled plugin files",
    "  help                                - Show this message",
    "  exit                                - Leave the interactive prompt",
];

const RESET_USAGE: &str = "Usage: reset <config|data|bundled-plugins>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTarget {
    Config,
    Data,
    BundledPlugins,
}

impl FromStr for ResetTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "config" => Ok(Self::Config),
            "data" => Ok(Self::Data),
            "bundled-plugins" => Ok(Self::BundledPlugins),
            _ => Err(Error::usage(RESET_USAGE)),
        }
    }
}

impl fmt::Display for ResetTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Config => "config",
            Self::Data => "data",
            Self::BundledPlugins => "bundled-plugins",
        })
    }
}

/// A reserved command. Anything else is a plugin invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    Init,
    Load(String),
    Reset(ResetTarget),
    Help,
    Exit,
}

impl CoreCommand {
    /// `None` when the first token is not reserved. A reserved name with bad
    /// arguments is a usage error.
    pub fn parse(tokens: &[String]) -> Option<Result<Self>> {
        let (first, rest) = tokens.split_first()?;
        let arg = rest.first().map(String::as_str);
        let cmd = match first.as_str() {
            "init" => Ok(Self::Init),
            "help" => Ok(Self::Help),
            "exit" => Ok(Self::Exit),
            "load" => match arg {
                Some(path) if !path.trim().is_empty() => Ok(Self::Load(path.to_string())),
                _ => Err(Error::usage(
                    "Please provide the path to load as data directory.",
                )),
            },
            "reset" => match arg {
                Some(target) => target.parse().map(Self::Reset),
                None => Err(Error::usage(RESET_USAGE)),
            },
            _ => return None,
        };
        Some(cmd)
    }
}

/// Lines to print and whether the command succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreReply {
    pub lines: Vec<String>,
    pub success: bool,
}

impl CoreReply {
    fn ok(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            success: true,
        }
    }
}

/// Run a reserved command other than `exit`.
pub fn run(hub: &Hub, cmd: &CoreCommand) -> Result<CoreReply> {
    let dirs = hub.dirs();
    match cmd {
        CoreCommand::Init => Ok(CoreReply::ok(
            dirs.init_local().map_err(Error::Directory)?.to_string(),
        )),
        CoreCommand::Load(raw) => {
            let outcome = dirs.load_override(raw).map_err(Error::Directory)?;
            if raw != LOAD_DEFAULT && outcome.is_success() {
                info!(path = %raw, "data directory override set");
            }
            Ok(CoreReply {
                lines: vec![outcome.to_string()],
                success: outcome.is_success(),
            })
        }
        CoreCommand::Reset(target) => reset(hub, *target),
        CoreCommand::Help => Ok(CoreReply {
            lines: HELP.map(String::from).to_vec(),
            success: true,
        }),
        CoreCommand::Exit => Ok(CoreReply {
            lines: Vec::new(),
            success: true,
        }),
    }
}

fn reset(hub: &Hub, target: ResetTarget) -> Result<CoreReply> {
    let dirs = hub.dirs();
    let reply = match target {
        ResetTarget::Config => {
            let dir = dirs.config_dir().map_err(Error::Directory)?;
            std::fs::remove_dir_all(&dir)?;
            CoreReply::ok(format!("Removed config directory {}.", dir.display()))
        }
        ResetTarget::Data => {
            let dir = dirs.default_data_dir().map_err(Error::Directory)?;
            std::fs::remove_dir_all(&dir)?;
            std::fs::create_dir_all(&dir)?;
            CoreReply::ok(format!("Cleared data directory {}.", dir.display()))
        }
        ResetTarget::BundledPlugins => {
            let report = hub.store().sync_bundled(true)?;
            CoreReply::ok(format!(
                "Restored {} bundled plugins.",
                report.written.len()
            ))
        }
    };
    info!(%target, "reset");
    Ok(reply)
}
