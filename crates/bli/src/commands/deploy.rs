//! Deploy command

use anyhow::{Context, Result};
use bli_core::{BuildWorkspace, RenderFailure};
use bli_pulumi::operations::deploy;
use bli_pulumi::{DeployOutcome, ProcessRunner, Recovery};

use crate::cli::StackArgs;
use crate::output;

pub async fn run(args: StackArgs) -> Result<()> {
    let runner = ProcessRunner::new();
    let ctx = super::prepare(&runner, &args, BuildWorkspace::new, RenderFailure::Fail).await?;

    output::header(&format!("Deploying stack '{}'", ctx.stack()));

    let spinner = output::spinner_unless(args.verbose, "Running pulumi up...");
    let result = deploy(&ctx).await;
    spinner.finish_and_clear();

    match result.with_context(|| format!("Deployment of stack '{}' failed", ctx.stack()))? {
        DeployOutcome::AlreadyOwned { message } => {
            output::info(&message);
            output::success("Resources already exist and are owned by this project");
        }
        DeployOutcome::Deployed { summary } => {
            output::success("Deployment completed successfully");
            if let Some(summary) = summary {
                println!("{}", summary);
            }
        }
        DeployOutcome::Recovered(Recovery::Replaced(urn)) => {
            output::kv("Replaced", &urn);
            output::success("Deployment completed successfully");
        }
        DeployOutcome::Recovered(Recovery::RefreshOnly) => {
            output::warning("Deployment needed a refresh-only update to reconcile state");
            output::success("Deployment completed successfully");
        }
    }
    Ok(())
}
