//! Stack commands
//!
//! Every stack command starts from a [`StackContext`], which performs the
//! shared prelude: environment overlay, proxy and gcloud setup, build
//! directory preparation, lock clearing and template rendering. The
//! individual operations then drive `pulumi` through the context.

mod deploy;
mod destroy;
mod graph;
mod init;
mod preview;

pub use deploy::{deploy, DeployOutcome, Recovery};
pub use destroy::{destroy, AssumeYes, Confirm, DestroyOutcome};
pub use graph::{graph, GraphOptions, GraphReport};
pub use init::{init, InitOptions, InitReport, TROUBLESHOOTING_TIPS};
pub use preview::preview;

use std::path::Path;

use bli_core::{
    locks, BuildWorkspace, Error, RenderContext, RenderFailure, Result, StackConfig,
    TemplateRenderer, ToolEnvironment,
};
use tracing::{debug, info, warn};

use crate::gcloud;
use crate::pulumi::{LoginOutcome, Pulumi, LOGIN_ATTEMPTS, PULUMI};
use crate::runner::{CommandRunner, OutputMode};

/// Resolved configuration, prepared build directory and tool environment
/// for one stack command
pub struct StackContext<'a> {
    runner: &'a dyn CommandRunner,
    config: StackConfig,
    workspace: BuildWorkspace,
    env: ToolEnvironment,
    renderer: TemplateRenderer,
    verbose: bool,
}

impl<'a> StackContext<'a> {
    /// Run the prelude shared by preview, deploy, destroy and graph
    ///
    /// `home` is where application default credentials are looked up.
    pub async fn prepare(
        runner: &'a dyn CommandRunner,
        config: StackConfig,
        workspace: BuildWorkspace,
        home: &Path,
        on_render_failure: RenderFailure,
        verbose: bool,
    ) -> Result<Self> {
        debug!("Using work directory: {}", workspace.work_dir().display());
        debug!("Using build directory: {}", workspace.build_dir().display());
        debug!("PULUMI_HOME set to: {}", workspace.pulumi_home().display());

        let env = ToolEnvironment::for_stack(&config, workspace.pulumi_home(), home)?;
        gcloud::configure(runner, &config, &env).await?;

        let renderer = TemplateRenderer::new()?;
        let context = RenderContext::from_config(&config);
        workspace.prepare(&renderer, &context, on_render_failure)?;

        let ctx = Self {
            runner,
            config,
            workspace,
            env,
            renderer,
            verbose,
        };
        ctx.clear_locks();
        if verbose {
            ctx.report_pulumi_home().await;
        }
        Ok(ctx)
    }

    pub fn pulumi(&self) -> Pulumi<'a> {
        Pulumi::new(self.runner, self.workspace.build_dir(), self.env.clone())
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    pub fn stack(&self) -> &str {
        &self.config.stack_name
    }

    pub fn workspace(&self) -> &BuildWorkspace {
        &self.workspace
    }

    pub fn env(&self) -> &ToolEnvironment {
        &self.env
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Verbose runs stream Pulumi output straight to the terminal
    pub fn output_mode(&self) -> OutputMode {
        if self.verbose {
            OutputMode::Inherit
        } else {
            OutputMode::Capture
        }
    }

    /// Delete lock files left behind for this stack
    pub fn clear_locks(&self) -> usize {
        let removed = locks::clear_stack_locks(self.workspace.pulumi_home(), self.stack());
        if removed > 0 {
            info!("Cleared {} lock file(s) for stack '{}'", removed, self.stack());
        }
        removed
    }

    /// Log in to the local backend
    pub async fn login(&self) -> Result<LoginOutcome> {
        debug!("Logging in to Pulumi backend...");
        let outcome = self.pulumi().login(LOGIN_ATTEMPTS).await?;
        match &outcome {
            LoginOutcome::LoggedIn(command) => info!("Login successful with command: {}", command),
            LoginOutcome::Failed(output) => {
                warn!("Failed to log in to Pulumi backend: {}", output.error_text())
            }
        }
        Ok(outcome)
    }

    /// Create the stack when it is missing, select it and set the project keys
    pub async fn ensure_stack(&self) -> Result<()> {
        let pulumi = self.pulumi();
        let stack = self.stack();

        let exists = if self.workspace.has_stack_state(stack) {
            debug!("Found existing stack state for '{}'", stack);
            true
        } else if let Some(line) = pulumi.find_stack(stack).await? {
            debug!("Found stack in list: {}", line);
            true
        } else {
            false
        };

        if !exists {
            info!("Stack '{}' not found. Creating new stack...", stack);
            self.workspace.ensure_project_file(&self.renderer)?;
            let created = pulumi.stack_init(stack).await?;
            let error_output = created.error_text();
            if created.success() {
                info!("Created stack: {}", stack);
            } else if error_output.contains("already exists") {
                info!("Stack already exists, selecting it instead");
            } else if error_output.contains("PULUMI_ACCESS_TOKEN") {
                warn!("Login issue detected. Trying explicit login...");
                pulumi.run(&["login", "file://"]).await?;
                let retried = pulumi.stack_init(stack).await?;
                if !retried.success() {
                    debug!("Stack creation output: {}", retried.error_text());
                }
            } else {
                debug!("Stack creation output: {}", error_output);
            }
        }

        let selected = pulumi.stack_select(stack).await?;
        if selected.success() {
            debug!("Selected stack: {}", stack);
        } else {
            debug!("Stack selection output: {}", selected.error_text());
        }

        let project_id = &self.config.project_id;
        for key in ["gcp:project", "project"] {
            let output = pulumi.config_set(key, project_id).await?;
            if !output.success() {
                debug!("Setting {} failed: {}", key, output.error_text());
            }
        }
        Ok(())
    }

    /// Check which PULUMI_HOME the engine reports
    async fn report_pulumi_home(&self) {
        let Ok(about) = self.pulumi().about().await else {
            return;
        };
        let expected = self.workspace.pulumi_home().to_string_lossy().into_owned();
        match about.stdout.lines().find(|line| line.contains("PULUMI_HOME")) {
            Some(line) => {
                debug!("Pulumi reports: {}", line.trim());
                if !line.contains(&expected) {
                    warn!("Pulumi not using specified home directory! Expected: {}", expected);
                }
            }
            None => debug!("Pulumi reports: PULUMI_HOME not found in output"),
        }
    }
}

/// Failure of a `pulumi` command that already ran
pub(crate) fn pulumi_failure(args: &[&str], code: i32, message: impl Into<String>) -> Error {
    let mut command = String::from(PULUMI);
    for arg in args {
        command.push(' ');
        command.push_str(arg);
    }
    Error::tool_failed(PULUMI, command, code, message)
}
