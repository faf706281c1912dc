//! `pulumi` command builders
//!
//! [`Pulumi`] binds a runner, the build directory and the environment overlay
//! so that each method maps to exactly one `pulumi` command line.

use std::path::{Path, PathBuf};

use bli_core::{Result, ToolEnvironment};
use tracing::debug;

use crate::runner::{CommandOutput, CommandRunner, Invocation, OutputMode};

pub const PULUMI: &str = "pulumi";

/// Local-backend login attempts for stack commands; first success wins
pub const LOGIN_ATTEMPTS: &[&[&str]] = &[
    &["login", "file://~", "--local"],
    &["login", "file://", "--local"],
    &["login", "file://~"],
    &["login", "file://"],
    &["login", "--local"],
];

/// Login attempts used by `bli init`
pub const INIT_LOGIN_ATTEMPTS: &[&[&str]] = &[
    &["login", "file://~", "--non-interactive"],
    &["login", "file://", "--non-interactive"],
];

/// How `pulumi up` is invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpMode {
    /// `up --yes --stack <s> --skip-preview`
    SkipPreview,
    /// `up --yes --stack <s> --replace <urn>`
    Replace(String),
    /// `up --yes --stack <s> --refresh-only`
    RefreshOnly,
    /// `up --yes --stack <s>`
    Plain,
}

impl UpMode {
    pub fn args<'s>(&'s self, stack: &'s str) -> Vec<&'s str> {
        let mut args = vec!["up", "--yes", "--stack", stack];
        match self {
            Self::SkipPreview => args.push("--skip-preview"),
            Self::Replace(urn) => args.extend(["--replace", urn.as_str()]),
            Self::RefreshOnly => args.push("--refresh-only"),
            Self::Plain => {}
        }
        args
    }
}

/// Result of trying a list of login commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Logged in with this command line
    LoggedIn(String),
    /// Every attempt failed; output of the last one
    Failed(CommandOutput),
}

impl LoginOutcome {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn(_))
    }
}

/// `pulumi` bound to a working directory and environment
pub struct Pulumi<'a> {
    runner: &'a dyn CommandRunner,
    cwd: PathBuf,
    env: ToolEnvironment,
}

impl<'a> Pulumi<'a> {
    pub fn new(runner: &'a dyn CommandRunner, cwd: impl Into<PathBuf>, env: ToolEnvironment) -> Self {
        Self {
            runner,
            cwd: cwd.into(),
            env,
        }
    }

    pub fn invocation(&self, args: &[&str]) -> Invocation {
        Invocation::new(PULUMI, args.iter().copied())
            .cwd(&self.cwd)
            .env(self.env.clone())
    }

    pub async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        self.run_with(args, OutputMode::Capture).await
    }

    pub async fn run_with(&self, args: &[&str], mode: OutputMode) -> Result<CommandOutput> {
        self.runner.run(&self.invocation(args).mode(mode)).await
    }

    /// Try each login command in order until one succeeds
    pub async fn login(&self, attempts: &[&[&str]]) -> Result<LoginOutcome> {
        let mut last = CommandOutput::default();
        for args in attempts {
            let invocation = self.invocation(args);
            let output = self.runner.run(&invocation).await?;
            if output.success() {
                debug!("Login successful with command: {}", invocation);
                return Ok(LoginOutcome::LoggedIn(invocation.command_line()));
            }
            debug!("Login attempt failed: {}", invocation);
            last = output;
        }
        Ok(LoginOutcome::Failed(last))
    }

    pub async fn stack_ls(&self) -> Result<CommandOutput> {
        self.run(&["stack", "ls"]).await
    }

    /// The `stack ls` line naming `stack`, if the listing succeeds and has one
    pub async fn find_stack(&self, stack: &str) -> Result<Option<String>> {
        let output = self.stack_ls().await?;
        if !output.success() {
            return Ok(None);
        }
        Ok(output
            .stdout
            .lines()
            .find(|line| line.contains(stack))
            .map(|line| line.trim().to_string()))
    }

    pub async fn stack_init(&self, stack: &str) -> Result<CommandOutput> {
        self.run(&["stack", "init", stack, "--non-interactive"]).await
    }

    pub async fn stack_select(&self, stack: &str) -> Result<CommandOutput> {
        self.run(&["stack", "select", stack]).await
    }

    pub async fn stack_rm(&self, stack: &str, force: bool) -> Result<CommandOutput> {
        if force {
            self.run(&["stack", "rm", "--yes", "--force", stack]).await
        } else {
            self.run(&["stack", "rm", "--yes", stack]).await
        }
    }

    pub async fn stack_export(&self, stack: &str) -> Result<CommandOutput> {
        self.run(&["stack", "export", "--stack", stack]).await
    }

    pub async fn stack_import(&self, file: &Path, stack: &str) -> Result<CommandOutput> {
        let file = file.to_string_lossy();
        self.run(&["stack", "import", "--file", &*file, "--stack", stack])
            .await
    }

    pub async fn stack_graph(&self, file: &Path, stack: &str) -> Result<CommandOutput> {
        let file = file.to_string_lossy();
        self.run(&["stack", "graph", &*file, "--stack", stack]).await
    }

    pub async fn config_set(&self, key: &str, value: &str) -> Result<CommandOutput> {
        self.run(&["config", "set", key, value]).await
    }

    pub async fn preview(&self, stack: &str, mode: OutputMode) -> Result<CommandOutput> {
        self.run_with(&["preview", "--stack", stack], mode).await
    }

    pub async fn refresh(&self, stack: &str) -> Result<CommandOutput> {
        self.run(&["refresh", "--yes", "--stack", stack, "--skip-preview"])
            .await
    }

    pub async fn up(&self, stack: &str, up: &UpMode, mode: OutputMode) -> Result<CommandOutput> {
        self.run_with(&up.args(stack), mode).await
    }

    pub async fn destroy(&self, stack: &str, mode: OutputMode) -> Result<CommandOutput> {
        self.run_with(&["destroy", "--yes", "--stack", stack, "--skip-preview"], mode)
            .await
    }

    pub async fn about(&self) -> Result<CommandOutput> {
        self.run(&["about"]).await
    }
}
