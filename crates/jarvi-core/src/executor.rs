//! Process execution with a working directory and a hard timeout.
//!
//! Programs are spawned directly from an argument vector; there is no shell.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::allowlist::ParsedCommand;
use crate::error::{BridgeError, BridgeResult};

/// Captured result of a finished process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    pub command: String,
    /// stdout, or stderr when stdout is empty
    pub output: String,
    pub exit_code: i32,
    pub timestamp: DateTime<Utc>,
}

/// Runs argv commands in a fixed directory with a timeout.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    working_dir: PathBuf,
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new<P: AsRef<Path>>(working_dir: P, timeout: Duration) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
            timeout,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Run an allow-listed command.
    pub async fn run(&self, command: &ParsedCommand) -> BridgeResult<CommandOutput> {
        self.run_program(command.program(), command.args(), &command.argv.join(" "))
            .await
    }

    /// Spawn `program args..`, wait up to the timeout, and capture output.
    /// The child is killed if the timeout elapses.
    pub async fn run_program<S: AsRef<std::ffi::OsStr>>(
        &self,
        program: &str,
        args: &[S],
        display: &str,
    ) -> BridgeResult<CommandOutput> {
        debug!(program, cwd = %self.working_dir.display(), "Spawning process");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| BridgeError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(BridgeError::Timeout(self.timeout)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code().unwrap_or(-1);

        if !output.status.success() {
            return Err(BridgeError::ExitStatus {
                code: exit_code,
                stderr: stderr.trim_end().to_string(),
            });
        }

        Ok(CommandOutput {
            command: display.to_string(),
            output: if stdout.is_empty() { stderr } else { stdout },
            exit_code,
            timestamp: Utc::now(),
        })
    }
}
