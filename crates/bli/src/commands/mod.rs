//! Command implementations

pub mod clear;
pub mod depend;
pub mod deploy;
pub mod destroy;
pub mod graph;
pub mod init;
pub mod preview;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bli_core::{get_home_dir, BuildWorkspace, RenderFailure, StackConfig, WorkspaceSettings};
use bli_doctor::{Doctor, OutputFormat};
use bli_pulumi::{CommandRunner, StackContext};
use camino::Utf8Path;
use tracing::debug;

use crate::cli::StackArgs;
use crate::output;

/// Fail early when pulumi or gcloud is not usable
pub async fn ensure_dependencies() -> Result<()> {
    let spinner = output::spinner("Checking dependencies...");
    let result = Doctor::new().check().await;
    spinner.finish_and_clear();

    if !result.is_ready() {
        println!("{}", result.format(OutputFormat::Human));
        bail!("Some dependencies are missing. Run 'bli depend' to install them.");
    }
    Ok(())
}

/// Absolute form of the `--work-dir` argument
pub fn work_dir(path: &Utf8Path) -> Result<PathBuf> {
    std::path::absolute(path.as_std_path())
        .with_context(|| format!("Invalid working directory: {}", path))
}

/// Resolve stack flags against bli.yaml in `work_dir`
pub fn stack_config(args: &StackArgs, work_dir: &Path) -> Result<StackConfig> {
    let settings = WorkspaceSettings::load(work_dir)?;
    let config = StackConfig::from_cli(&args.options(), work_dir, &settings)?;

    debug!("Stack: {}", config.stack_name);
    debug!("Project: {}", config.project_id);
    debug!("Project type: {}", config.project_type.as_str());
    if config.no_proxy {
        debug!("Proxy: disabled");
    } else {
        debug!("Proxy: {}", config.proxy.url());
    }
    Ok(config)
}

/// Dependency check plus the shared stack prelude
///
/// `workspace` picks the build layout for the resolved work directory.
pub async fn prepare<'a>(
    runner: &'a dyn CommandRunner,
    args: &StackArgs,
    workspace: fn(&Path) -> BuildWorkspace,
    on_render_failure: RenderFailure,
) -> Result<StackContext<'a>> {
    ensure_dependencies().await?;

    let work_dir = work_dir(&args.work_dir)?;
    let config = stack_config(args, &work_dir)?;
    let home = get_home_dir()?;

    let ctx = StackContext::prepare(
        runner,
        config,
        workspace(&work_dir),
        &home,
        on_render_failure,
        args.verbose,
    )
    .await?;
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    use crate::cli::{Cli, Commands};

    fn stack_args(extra: &[&str]) -> StackArgs {
        let mut argv = vec!["bli", "preview"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Preview(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_work_dir_is_absolute() {
        let dir = work_dir(Utf8Path::new("infra")).unwrap();
        assert!(dir.is_absolute());
        assert!(dir.ends_with("infra"));
    }

    #[test]
    fn test_stack_config_uses_settings_file() {
        let temp = TempDir::new().unwrap();
        let settings = WorkspaceSettings {
            stack_name: Some("from-settings".into()),
            project_id: Some("settings-project".into()),
            ..Default::default()
        };
        settings.save(temp.path()).unwrap();

        let config = stack_config(&stack_args(&["-i", "cli-project"]), temp.path()).unwrap();
        assert_eq!(config.stack_name, "from-settings");
        assert_eq!(config.project_id, "cli-project");
    }

    #[test]
    fn test_stack_config_rejects_both_project_types() {
        let temp = TempDir::new().unwrap();
        let args = stack_args(&["-s", "dev", "-i", "p", "--stg", "--srv"]);
        let err = stack_config(&args, temp.path()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot specify both --stg and --srv flags");
    }
}
