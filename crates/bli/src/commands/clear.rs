//! Clear command - remove Pulumi lock directories

use anyhow::Result;
use bli_core::locks::clear_lock_dirs;
use bli_core::ClearOutcome;

use crate::cli::ClearArgs;
use crate::output;

pub async fn run(args: ClearArgs) -> Result<()> {
    super::ensure_dependencies().await?;

    let work_dir = super::work_dir(&args.work_dir)?;
    let stack = args.stack_name.as_deref().filter(|s| !s.is_empty());

    match clear_lock_dirs(&work_dir, stack)? {
        ClearOutcome::Removed(paths) => {
            for path in &paths {
                output::kv("Removed", &path.display().to_string());
            }
            match stack {
                Some(stack) => output::success(&format!("Cleared locks for stack '{}'", stack)),
                None => output::success("Cleared all locks"),
            }
        }
        ClearOutcome::NotFound(path) => {
            output::info(&format!("No locks found at {}", path.display()));
        }
    }
    Ok(())
}
