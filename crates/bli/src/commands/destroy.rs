//! Destroy command

use anyhow::Result;
use bli_core::{BuildWorkspace, RenderFailure};
use bli_pulumi::operations::destroy;
use bli_pulumi::{AssumeYes, Confirm, DestroyOutcome, ProcessRunner};

use crate::cli::DestroyArgs;
use crate::output;

/// Asks on the terminal, defaulting to no
struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bli_core::Result<bool> {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| bli_core::Error::Io(std::io::Error::other(e)))
    }
}

pub async fn run(args: DestroyArgs) -> Result<()> {
    let runner = ProcessRunner::new();
    let ctx = super::prepare(
        &runner,
        &args.stack,
        BuildWorkspace::for_destroy,
        RenderFailure::CopyRaw,
    )
    .await?;

    output::header(&format!("Destroying stack '{}'", ctx.stack()));

    let confirm: &dyn Confirm = if args.yes { &AssumeYes } else { &TerminalConfirm };

    match destroy(&ctx, confirm).await? {
        DestroyOutcome::Cancelled => output::info("Cancelled"),
        DestroyOutcome::Destroyed {
            metadata_removed,
            output: log,
        } => {
            if !log.is_empty() {
                println!("{}", log);
            }
            output::success(&format!("Stack '{}' destroyed", ctx.stack()));
            if metadata_removed {
                output::info("Stack metadata removed");
            }
        }
        DestroyOutcome::ForceRemoved => {
            output::warning("Stack was force-removed from state. Cloud resources may still exist.");
        }
    }
    Ok(())
}
