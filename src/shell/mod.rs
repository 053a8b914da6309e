//! Command shell: CLI arguments or interactive lines in, rendered lines out.
//!
//! Plugin output goes to `out`; dispatch failures and usage errors go to
//! `err` as a single line each.

mod core_commands;
mod lexer;

pub use core_commands::{CoreCommand, CoreReply, HELP, ResetTarget};
pub use lexer::split_line;

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::hub::Hub;
use crate::plugins::{CommandInvocation, DispatchOutcome};
use crate::{Error, Result};

pub const PROMPT: &str = "hub> ";
const INTERRUPTED: &str = "Interrupted.";

/// How one command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellStatus {
    Ok,
    Failed,
    Exit,
}

impl ShellStatus {
    pub fn is_failure(self) -> bool {
        self == Self::Failed
    }
}

pub struct Shell {
    hub: Hub,
}

impl Shell {
    pub fn new(hub: Hub) -> Self {
        Self { hub }
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Run one tokenized command. Usage errors are printed to `err` and
    /// reported as [`ShellStatus::Failed`]; directory and IO errors are
    /// returned.
    pub async fn execute(
        &self,
        tokens: &[String],
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> Result<ShellStatus> {
        if tokens.is_empty() {
            return Ok(ShellStatus::Ok);
        }

        if let Some(cmd) = CoreCommand::parse(tokens) {
            let cmd = match cmd {
                Ok(cmd) => cmd,
                Err(Error::Usage(message)) => {
                    writeln!(err, "{message}")?;
                    return Ok(ShellStatus::Failed);
                }
                Err(e) => return Err(e),
            };
            if cmd == CoreCommand::Exit {
                return Ok(ShellStatus::Exit);
            }
            let reply = core_commands::run(&self.hub, &cmd)?;
            let sink: &mut dyn Write = if reply.success { out } else { err };
            for line in &reply.lines {
                writeln!(sink, "{line}")?;
            }
            return Ok(if reply.success {
                ShellStatus::Ok
            } else {
                ShellStatus::Failed
            });
        }

        let Some(invocation) = CommandInvocation::from_tokens(tokens) else {
            return Ok(ShellStatus::Ok);
        };
        match self.hub.invoke(&invocation).await? {
            DispatchOutcome::Rendered(lines) => {
                for line in lines {
                    writeln!(out, "{line}")?;
                }
                Ok(ShellStatus::Ok)
            }
            DispatchOutcome::Failed(failure) => {
                writeln!(err, "{}", failure.message())?;
                Ok(ShellStatus::Failed)
            }
        }
    }

    /// Split `line` and run it.
    pub async fn execute_line(
        &self,
        line: &str,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> Result<ShellStatus> {
        match split_line(line) {
            Ok(tokens) => self.execute(&tokens, out, err).await,
            Err(Error::Usage(message)) => {
                writeln!(err, "{message}")?;
                Ok(ShellStatus::Failed)
            }
            Err(e) => Err(e),
        }
    }

    /// Prompt loop over stdin until `exit`, end of input or Ctrl-C at the
    /// prompt. Ctrl-C while a command runs cancels that command only. Errors
    /// of one command are printed and the loop continues.
    pub async fn run_interactive(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = std::io::stdout();
        let mut stderr = std::io::stderr();

        loop {
            write!(stdout, "{PROMPT}")?;
            stdout.flush()?;

            let next = until_interrupted(lines.next_line(), tokio::signal::ctrl_c()).await?;
            let Some(line) = next else {
                debug!("interrupted at prompt");
                writeln!(stdout)?;
                return Ok(());
            };
            let Some(line) = line? else {
                writeln!(stdout)?;
                return Ok(());
            };

            let command = self.execute_line(&line, &mut stdout, &mut stderr);
            match until_interrupted(command, tokio::signal::ctrl_c()).await? {
                Some(Ok(ShellStatus::Exit)) => return Ok(()),
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "command aborted");
                    writeln!(stderr, "{e}")?;
                }
                None => {
                    debug!(%line, "command interrupted");
                    writeln!(stderr, "{INTERRUPTED}")?;
                }
            }
        }
    }
}

/// Race `work` against `interrupt`. `None` means the interrupt fired first
/// and `work` was dropped, which also kills a running process plugin.
async fn until_interrupted<T>(
    work: impl Future<Output = T>,
    interrupt: impl Future<Output = std::io::Result<()>>,
) -> Result<Option<T>> {
    tokio::select! {
        value = work => Ok(Some(value)),
        signal = interrupt => {
            signal?;
            Ok(None)
        }
    }
}
