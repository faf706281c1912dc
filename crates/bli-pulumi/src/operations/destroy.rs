//! `bli destroy`

use bli_core::{Error, Result};
use tracing::{debug, info, warn};

use super::{pulumi_failure, StackContext};
use crate::colorize::colorize_pulumi_output;
use crate::pulumi::UpMode;
use crate::runner::{CommandOutput, OutputMode};

/// Yes/no questions asked during destroy
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Answers yes to everything (`--yes`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyOutcome {
    /// The user declined the destroy prompt
    Cancelled,
    /// Resources were destroyed
    Destroyed {
        /// `stack rm` succeeded after the metadata prompt
        metadata_removed: bool,
        /// Colorized output of the successful destroy; empty when streamed
        output: String,
    },
    /// Destroy kept failing and the stack was force-removed from state.
    /// Cloud resources may still exist.
    ForceRemoved,
}

pub async fn destroy(ctx: &StackContext<'_>, confirm: &dyn Confirm) -> Result<DestroyOutcome> {
    let stack = ctx.stack();
    let pulumi = ctx.pulumi();

    ctx.login().await?;
    ctx.workspace().ensure_project_file(ctx.renderer())?;

    let listed = pulumi.find_stack(stack).await?;
    let state = ctx.workspace().find_stack_state(stack);
    match (&listed, &state) {
        (Some(line), _) => debug!("Found stack in list: {}", line),
        (None, Some(path)) => debug!("Found stack state file {}", path.display()),
        (None, None) => {
            debug!(
                "Checked {} and the Pulumi stack listing",
                ctx.workspace().pulumi_home().join("stacks").display()
            );
            return Err(Error::stack_not_found(
                stack,
                "Cannot destroy a non-existent stack.",
            ));
        }
    }

    let select_args = ["stack", "select", stack];
    let selected = pulumi.run(&select_args).await?;
    if !selected.success() {
        let message = format!("Failed to select stack: {}", selected.error_text());
        return Err(pulumi_failure(&select_args, selected.code, message));
    }

    info!("Refreshing state before destroy...");
    let refresh = pulumi.refresh(stack).await?;
    if !refresh.success() {
        debug!("Refresh completed with warnings or errors. Continuing with destroy...");
    }

    let prompt = format!(
        "WARNING: This will destroy all resources in stack '{}'. Are you sure you want to continue?",
        stack
    );
    if !confirm.confirm(&prompt)? {
        info!("Destroy operation cancelled.");
        return Ok(DestroyOutcome::Cancelled);
    }

    info!("Destroying stack '{}'...", stack);
    let mode = ctx.output_mode();
    let mut output = pulumi.destroy(stack, mode).await?;

    if !output.success() {
        warn!("First destroy attempt failed. Trying with refresh-only...");
        log_output(&output, mode);
        let refresh_only = pulumi.up(stack, &UpMode::RefreshOnly, OutputMode::Capture).await?;
        if !refresh_only.success() {
            debug!("Refresh-only update failed: {}", refresh_only.error_text());
        }
        info!("Retrying destroy...");
        output = pulumi.destroy(stack, mode).await?;
    }

    if output.success() {
        info!("Stack successfully destroyed");
        let metadata_removed = remove_metadata(ctx, confirm).await?;
        return Ok(DestroyOutcome::Destroyed {
            metadata_removed,
            output: colorize_pulumi_output(&output.stdout),
        });
    }

    log_output(&output, mode);
    let destroy_args = ["destroy", "--yes", "--stack", stack, "--skip-preview"];
    let force_prompt = format!(
        "Destroy failed. Force remove stack '{}'? This removes the stack metadata without destroying resources.",
        stack
    );
    if !confirm.confirm(&force_prompt)? {
        warn!("Force-remove cancelled. Stack remains with possible resource leaks.");
        return Err(pulumi_failure(
            &destroy_args,
            output.code,
            format!("Failed to destroy stack '{}'", stack),
        ));
    }

    let removed = pulumi.stack_rm(stack, true).await?;
    if removed.success() {
        warn!("Stack metadata forcefully removed. Note that cloud resources may still exist.");
        Ok(DestroyOutcome::ForceRemoved)
    } else {
        let message = format!("Failed to force-remove stack: {}", removed.error_text());
        Err(pulumi_failure(
            &["stack", "rm", "--yes", "--force", stack],
            removed.code,
            message,
        ))
    }
}

async fn remove_metadata(ctx: &StackContext<'_>, confirm: &dyn Confirm) -> Result<bool> {
    if !confirm.confirm("Remove stack metadata as well? This completely removes the stack from Pulumi.")? {
        info!("Stack metadata preserved. You can reuse this stack in the future.");
        return Ok(false);
    }
    let removed = ctx.pulumi().stack_rm(ctx.stack(), false).await?;
    if removed.success() {
        info!("Stack metadata removed. Cleanup complete.");
        Ok(true)
    } else {
        warn!("Failed to remove stack metadata: {}", removed.error_text());
        Ok(false)
    }
}

fn log_output(output: &CommandOutput, mode: OutputMode) {
    if mode == OutputMode::Capture && !output.combined().trim().is_empty() {
        warn!("{}", colorize_pulumi_output(output.combined().trim_end()));
    }
}
