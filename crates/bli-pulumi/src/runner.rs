//! Subprocess execution
//!
//! Every `pulumi` and `gcloud` call goes through a [`CommandRunner`]. The
//! production runner spawns real processes; tests substitute a recording
//! double that returns scripted output.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use bli_core::{Error, Result, ToolEnvironment};
use tokio::process::Command;
use tracing::debug;

/// Where a subprocess writes its output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Collect stdout and stderr
    #[default]
    Capture,
    /// Stream straight to the terminal
    Inherit,
}

/// A fully described subprocess call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: ToolEnvironment,
    pub mode: OutputMode,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            env: ToolEnvironment::new(),
            mode: OutputMode::Capture,
        }
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, env: ToolEnvironment) -> Self {
        self.env = env;
        self
    }

    pub fn mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// `program arg1 arg2 ...`
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Exit status and captured output of a finished subprocess
///
/// In [`OutputMode::Inherit`] both streams are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }

    /// First non-empty of trimmed stderr and trimmed stdout
    pub fn error_text(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }

    /// Turn a non-zero exit into [`Error::ToolFailed`] with `message`
    pub fn check(self, invocation: &Invocation, message: impl Into<String>) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::tool_failed(
                invocation.program.clone(),
                invocation.command_line(),
                self.code,
                message,
            ))
        }
    }
}

/// Runs subprocesses on behalf of the operations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion
    ///
    /// A non-zero exit is not an error here; only a failure to start the
    /// process is.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runner backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        debug!("Running: {}", invocation);

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }
        command.envs(invocation.env.iter());

        let spawn_error = |e: std::io::Error| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(invocation.program.clone())
            } else {
                Error::Io(e)
            }
        };

        let output = match invocation.mode {
            OutputMode::Inherit => {
                let status = command
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .await
                    .map_err(spawn_error)?;
                CommandOutput {
                    code: status.code().unwrap_or(1),
                    ..Default::default()
                }
            }
            OutputMode::Capture => {
                let output = command
                    .stdin(Stdio::null())
                    .output()
                    .await
                    .map_err(spawn_error)?;
                CommandOutput {
                    code: output.status.code().unwrap_or(1),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                }
            }
        };

        if !output.success() {
            log_failure(invocation, &output);
        }
        Ok(output)
    }
}

fn log_failure(invocation: &Invocation, output: &CommandOutput) {
    if output.stderr.trim().is_empty() {
        debug!("Command failed ({}): {}", output.code, invocation);
    } else {
        debug!(
            "Command failed ({}): {}\nStderr: {}",
            output.code,
            invocation,
            output.stderr.trim()
        );
    }
}
