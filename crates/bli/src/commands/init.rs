//! Init command - scaffold a Pulumi project and stack

use anyhow::{bail, Context, Result};
use bli_core::{resolve_stack_name, WorkspaceSettings};
use bli_doctor::Doctor;
use bli_pulumi::operations::{init, TROUBLESHOOTING_TIPS};
use bli_pulumi::{InitOptions, ProcessRunner};
use owo_colors::OwoColorize;

use crate::cli::InitArgs;
use crate::output;

pub async fn run(args: InitArgs) -> Result<()> {
    let spinner = output::spinner("Setting up BLI environment...");
    let summary = Doctor::new().install().await;
    spinner.finish_and_clear();
    print!("{}", summary.format());
    if !summary.all_succeeded() {
        bail!("Required dependencies are missing. Run 'bli depend' for details.");
    }

    let work_dir = super::work_dir(&args.work_dir)?;
    let mut settings = WorkspaceSettings::load(&work_dir)?;
    if let Some(project_id) = args.project_id.filter(|id| !id.is_empty()) {
        settings.project_id = Some(project_id);
    }
    let stack_name = resolve_stack_name(args.stack_name.as_deref(), &work_dir, &settings)?;

    output::header(&format!("Initializing stack '{}'", stack_name));
    output::kv("Work directory", &work_dir.display().to_string());

    let runner = ProcessRunner::new();
    let options = InitOptions {
        work_dir,
        stack_name,
        settings,
    };

    let report = match init(&runner, &options).await {
        Ok(report) => report,
        Err(err) => {
            println!("\n{}", "Troubleshooting tips:".yellow());
            for tip in TROUBLESHOOTING_TIPS {
                println!("  • {}", tip);
            }
            return Err(err).context("Stack initialization failed");
        }
    };

    if let Some(backup) = &report.backup {
        output::info(&format!("Backed up existing Pulumi.yaml to {}", backup.display()));
    }
    output::kv("Project", &report.project_name);
    if !report.stack_created {
        output::info(&format!("Stack '{}' already exists, selected it", options.stack_name));
    }
    if report.stack_file_created {
        output::kv("Stack file", &format!("Pulumi.{}.yaml", options.stack_name));
    }
    output::kv("Settings", &report.settings_file.display().to_string());
    output::success(&format!("Stack '{}' initialized", options.stack_name));
    Ok(())
}
