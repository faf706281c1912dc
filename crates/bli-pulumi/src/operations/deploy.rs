//! `bli deploy`
//!
//! Refresh, repair state for resources deleted out of band, then `up`. A
//! failed `up` is retried by replacing the failing resources, then by a
//! refresh-only update followed by a plain `up`.

use bli_core::Result;
use tracing::{debug, info, warn};

use super::{pulumi_failure, StackContext};
use crate::diagnostics::{
    extract_failing_resources, is_conflict_owned, mentions_missing, resources_summary,
    simplify_resource_error,
};
use crate::pulumi::{Pulumi, UpMode};
use crate::runner::OutputMode;
use crate::state::repair_state;

/// How a recovered deployment got through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// `up --replace <urn>` succeeded
    Replaced(String),
    /// refresh-only update followed by a plain `up` succeeded
    RefreshOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// GCP answered 409 for a resource this project already owns
    AlreadyOwned { message: String },
    /// The first `up` succeeded. `summary` is the `Resources:` section, or
    /// the whole output when verbose.
    Deployed { summary: Option<String> },
    Recovered(Recovery),
}

pub async fn deploy(ctx: &StackContext<'_>) -> Result<DeployOutcome> {
    ctx.login().await?;
    ctx.ensure_stack().await?;

    let stack = ctx.stack();
    let pulumi = ctx.pulumi();

    info!("Refreshing state...");
    let refresh = pulumi.refresh(stack).await?;
    let refresh_output = refresh.combined();
    if is_conflict_owned(&refresh_output) {
        let message = simplify_resource_error(&refresh_output).message;
        return Ok(DeployOutcome::AlreadyOwned { message });
    }
    if refresh.success() {
        debug!("Refresh completed successfully");
    } else {
        let diagnosis = simplify_resource_error(&refresh_output);
        if diagnosis.is_simplified() {
            warn!("Refresh completed with errors: {}", diagnosis.message);
        } else {
            debug!("Refresh completed with warnings or errors:\n{}", refresh_output);
        }
    }

    if mentions_missing(&refresh_output) {
        let failing = extract_failing_resources(&refresh_output);
        if !failing.is_empty() {
            info!("Attempting to fix state for {} missing resource(s)", failing.len());
            let state_file = ctx.workspace().fixed_state_file();
            if let Err(e) = repair_state(&pulumi, stack, &failing, &state_file).await {
                warn!("Error fixing state: {}", e);
            }
        }
    }

    ctx.clear_locks();

    info!("Deploying stack '{}'...", stack);
    let up_mode = UpMode::SkipPreview;
    let up = pulumi.up(stack, &up_mode, OutputMode::Capture).await?;
    let up_output = up.combined();

    if is_conflict_owned(&up_output) {
        let message = simplify_resource_error(&up_output).message;
        return Ok(DeployOutcome::AlreadyOwned { message });
    }
    if up.success() {
        let summary = if ctx.verbose() {
            Some(up_output)
        } else {
            resources_summary(&up_output)
        };
        return Ok(DeployOutcome::Deployed { summary });
    }

    let diagnosis = simplify_resource_error(&up_output);
    let failure = if diagnosis.is_simplified() {
        warn!("Deployment failed: {}", diagnosis.message);
        debug!("Raw output:\n{}", up_output);
        format!("Deployment failed: {}", diagnosis.message)
    } else {
        warn!("Deployment failed:\n{}", up_output.trim_end());
        "Deployment failed".to_string()
    };

    if mentions_missing(&up_output) {
        let failing = extract_failing_resources(&up_output);
        if failing.is_empty() {
            warn!("Could not identify specific failing resources, trying refresh-only update...");
        } else {
            info!("Attempting to replace failing resources...");
            if let Some(urn) = replace_any(ctx, &pulumi, &failing).await? {
                return Ok(DeployOutcome::Recovered(Recovery::Replaced(urn)));
            }
            warn!("Resource replacement failed, trying refresh-only update...");
        }
    } else {
        info!("Trying refresh-only update...");
    }

    refresh_then_up(ctx, &pulumi, &failure).await
}

/// `up --replace` each resource in turn; the first success wins
async fn replace_any(
    ctx: &StackContext<'_>,
    pulumi: &Pulumi<'_>,
    failing: &[String],
) -> Result<Option<String>> {
    for urn in failing {
        debug!("Replacing {}", urn);
        let output = pulumi
            .up(ctx.stack(), &UpMode::Replace(urn.clone()), ctx.output_mode())
            .await?;
        if output.success() {
            info!("Successfully replaced resource {}", urn);
            return Ok(Some(urn.clone()));
        }
    }
    Ok(None)
}

async fn refresh_then_up(
    ctx: &StackContext<'_>,
    pulumi: &Pulumi<'_>,
    failure: &str,
) -> Result<DeployOutcome> {
    let stack = ctx.stack();
    let mode = ctx.output_mode();

    let refresh_only = UpMode::RefreshOnly;
    let output = pulumi.up(stack, &refresh_only, mode).await?;
    if !output.success() {
        return Err(pulumi_failure(&refresh_only.args(stack), output.code, failure));
    }

    info!("Refresh-only update succeeded, trying normal update...");
    let plain = UpMode::Plain;
    let output = pulumi.up(stack, &plain, mode).await?;
    if output.success() {
        info!("Final deployment succeeded");
        Ok(DeployOutcome::Recovered(Recovery::RefreshOnly))
    } else {
        Err(pulumi_failure(
            &plain.args(stack),
            output.code,
            format!("Final deployment attempt failed. {}", failure),
        ))
    }
}
