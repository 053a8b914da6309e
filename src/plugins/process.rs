//! Out-of-process plugins speaking JSON over stdio.
//!
//! The host writes one request line to the child's stdin:
//!
//! ```json
//! {"command": "main", "args": ["..."], "api": { ...snapshot... }}
//! ```
//!
//! and expects a single JSON object on stdout, either `{"output": <value>}`
//! or `{"error": "<message>"}`.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::api::{Api, Capabilities, Capability};
use super::descriptor::PluginDescriptor;
use super::error::{PluginError, PluginResult};
use super::namespace::DEFAULT_COMMAND;
use super::output::Output;
use super::runtime::Plugin;

#[derive(Serialize)]
struct Request<'a> {
    command: &'a str,
    args: &'a [String],
    api: Value,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProcessPlugin {
    name: String,
    program: PathBuf,
    args: Vec<String>,
    commands: Vec<String>,
    api: serde_json::Map<String, Value>,
    timeout: Duration,
}

impl ProcessPlugin {
    pub fn new(
        name: &str,
        program: PathBuf,
        args: Vec<String>,
        descriptor: &PluginDescriptor,
        timeout: Duration,
    ) -> Self {
        let commands = if descriptor.commands.is_empty() {
            vec![DEFAULT_COMMAND.to_string()]
        } else {
            descriptor.commands.clone()
        };
        Self {
            name: name.to_string(),
            program,
            args,
            commands,
            api: descriptor.api.clone(),
            timeout,
        }
    }

    fn fail(&self, reason: impl std::fmt::Display) -> PluginError {
        PluginError::execution(format!("{} ({}): {reason}", self.name, self.program.display()))
    }
}

#[async_trait]
impl Plugin for ProcessPlugin {
    fn commands(&self) -> Vec<String> {
        self.commands.clone()
    }

    fn contribute_api(&self, _core: &Api) -> Option<Capabilities> {
        if self.api.is_empty() {
            return None;
        }
        Some(
            self.api
                .iter()
                .map(|(k, v)| (k.clone(), Capability::Value(v.clone())))
                .collect(),
        )
    }

    async fn dispatch(&self, command: &str, api: &Api, args: &[String]) -> PluginResult<Output> {
        let mut request = serde_json::to_vec(&Request {
            command,
            args,
            api: api.snapshot()?,
        })?;
        request.push(b'\n');

        debug!(plugin = %self.name, program = %self.program.display(), %command, "spawning plugin process");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .current_dir(api.cwd())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.fail(format!("failed to spawn: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A child that exits without reading its input is not an error here;
            // its exit status decides.
            if let Err(e) = stdin.write_all(&request).await
                && e.kind() != std::io::ErrorKind::BrokenPipe
            {
                return Err(self.fail(format!("failed to write request: {e}")));
            }
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| self.fail(format!("timed out after {}s", self.timeout.as_secs())))?
            .map_err(|e| self.fail(e))?;

        if !output.status.success() {
            return Err(self.fail(format!("exited with {}", output.status)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Ok(Output::Empty);
        }
        let response: Response = serde_json::from_str(stdout.trim())
            .map_err(|e| self.fail(format!("malformed response: {e}")))?;

        if let Some(message) = response.error {
            return Err(PluginError::execution(message));
        }
        Ok(Output::from_json(response.output))
    }
}
