use serde::Serialize;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Exit code reported when a command never produced one
pub const NO_EXIT_CODE: i32 = -1;

/// Outcome of running (or simulating) one command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub command: String,
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Set when the command could not be run to completion, e.g. on timeout
    pub error: Option<String>,
}

impl ExecutionResult {
    fn failed(command: &str, error: String) -> Self {
        Self {
            command: command.to_string(),
            success: false,
            exit_code: NO_EXIT_CODE,
            stdout: String::new(),
            stderr: String::new(),
            error: Some(error),
        }
    }

    fn from_status(command: &str, status: ExitStatus, stdout: String, stderr: String) -> Self {
        Self {
            command: command.to_string(),
            success: status.success(),
            exit_code: status.code().unwrap_or(NO_EXIT_CODE),
            stdout,
            stderr,
            error: None,
        }
    }

    /// stdout and stderr joined by a newline, skipping empty streams
    pub fn output(&self) -> String {
        [self.stdout.as_str(), self.stderr.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Runs command lines through a shell
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    shell: String,
    timeout: Option<Duration>,
}

impl CommandExecutor {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            timeout: None,
        }
    }

    /// `None` lets commands run indefinitely
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn command(&self, line: &str) -> Command {
        let mut command = Command::new(&self.shell);
        command.arg("-c").arg(line).kill_on_drop(true);
        command
    }

    fn timeout_message(&self) -> String {
        let secs = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
        format!("Command timed out after {} seconds", secs)
    }

    /// Run a command and capture its output
    pub async fn execute(&self, line: &str) -> ExecutionResult {
        debug!(command = line, shell = %self.shell, "executing captured");

        let mut command = self.command(line);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, command.output()).await {
                Ok(output) => output,
                Err(_) => {
                    warn!(command = line, "command timed out");
                    return ExecutionResult::failed(line, self.timeout_message());
                }
            },
            None => command.output().await,
        };

        match output {
            Ok(output) => ExecutionResult::from_status(
                line,
                output.status,
                String::from_utf8_lossy(&output.stdout).to_string(),
                String::from_utf8_lossy(&output.stderr).to_string(),
            ),
            Err(e) => {
                warn!(command = line, error = %e, "failed to spawn command");
                ExecutionResult::failed(line, format!("Failed to execute command: {}", e))
            }
        }
    }

    /// Run a command attached to the current terminal
    ///
    /// Output is not captured, so interactive rewrites such as `rm -i` can
    /// prompt the user directly.
    pub async fn execute_streaming(&self, line: &str) -> ExecutionResult {
        debug!(command = line, shell = %self.shell, "executing streaming");

        let mut command = self.command(line);
        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(command = line, error = %e, "failed to spawn command");
                return ExecutionResult::failed(line, format!("Failed to execute command: {}", e));
            }
        };

        let status = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    warn!(command = line, "command timed out");
                    if let Err(e) = child.kill().await {
                        warn!(error = %e, "failed to kill timed out command");
                    }
                    return ExecutionResult::failed(line, self.timeout_message());
                }
            },
            None => child.wait().await,
        };

        match status {
            Ok(status) => ExecutionResult::from_status(line, status, String::new(), String::new()),
            Err(e) => ExecutionResult::failed(line, format!("Failed to wait for command: {}", e)),
        }
    }

    /// Report what would run without running it
    pub fn dry_run(&self, line: &str) -> ExecutionResult {
        ExecutionResult {
            command: line.to_string(),
            success: true,
            exit_code: 0,
            stdout: format!("[DRY RUN] Would execute: {}", line),
            stderr: String::new(),
            error: None,
        }
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new("sh")
    }
}
