use bli_core::Result;
use tracing::{debug, info};

use super::{pulumi_failure, StackContext};
use crate::colorize::colorize_pulumi_output;
use crate::diagnostics::simplify_resource_error;
use crate::runner::OutputMode;

/// `pulumi preview` for the context's stack
///
/// Returns the colorized preview when output was captured, `None` when it
/// was streamed to the terminal. A failed preview carries Pulumi's exit code.
pub async fn preview(ctx: &StackContext<'_>) -> Result<Option<String>> {
    ctx.login().await?;
    ctx.ensure_stack().await?;

    let stack = ctx.stack();
    let pulumi = ctx.pulumi();
    let mode = ctx.output_mode();

    info!("Previewing changes for stack '{}'...", stack);
    let output = pulumi.preview(stack, mode).await?;

    if output.success() {
        return Ok(match mode {
            OutputMode::Inherit => None,
            OutputMode::Capture => Some(colorize_pulumi_output(&output.stdout)),
        });
    }

    let message = match mode {
        OutputMode::Inherit => format!("Preview failed with exit code {}", output.code),
        OutputMode::Capture => {
            debug!("Raw preview output:\n{}", output.combined());
            simplify_resource_error(&output.combined()).message
        }
    };
    Err(pulumi_failure(&["preview", "--stack", stack], output.code, message))
}
