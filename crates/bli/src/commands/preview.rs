//! Preview command

use anyhow::Result;
use bli_core::{BuildWorkspace, RenderFailure};
use bli_pulumi::operations::preview;
use bli_pulumi::ProcessRunner;

use crate::cli::StackArgs;
use crate::output;

pub async fn run(args: StackArgs) -> Result<()> {
    let runner = ProcessRunner::new();
    let ctx = super::prepare(&runner, &args, BuildWorkspace::new, RenderFailure::Fail).await?;

    output::header(&format!("Previewing stack '{}'", ctx.stack()));

    let spinner = output::spinner_unless(args.verbose, "Running pulumi preview...");
    let result = preview(&ctx).await;
    spinner.finish_and_clear();

    if let Some(changes) = result? {
        println!("{}", changes);
    }
    output::success("Preview completed");
    Ok(())
}
