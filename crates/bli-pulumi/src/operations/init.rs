//! `bli init`
//!
//! Scaffolds a YAML Pulumi project in the work directory and creates the
//! stack. An existing `Pulumi.yaml` is moved aside first and put back if
//! anything fails.

use std::fs;
use std::path::{Path, PathBuf};

use bli_core::templates::project_name_for;
use bli_core::{Result, TemplateRenderer, ToolEnvironment, WorkspaceSettings};
use tracing::{info, warn};

use super::pulumi_failure;
use crate::diagnostics::interpret_pulumi_error;
use crate::pulumi::{LoginOutcome, Pulumi, INIT_LOGIN_ATTEMPTS};
use crate::runner::CommandRunner;

pub const TROUBLESHOOTING_TIPS: &[&str] = &[
    "Ensure you have the latest version of Pulumi CLI installed",
    "Try with a different stack name",
    "Check permissions in your home directory",
    "Run 'bli depend' to verify dependencies are correctly installed",
];

const BACKUP_FILE_NAME: &str = "Pulumi.yaml.backup";

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub work_dir: PathBuf,
    pub stack_name: String,
    /// Saved to bli.yaml with `stack_name` filled in
    pub settings: WorkspaceSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub project_name: String,
    /// `false` when the stack already existed and was selected
    pub stack_created: bool,
    /// `Pulumi.<stack>.yaml` was written (it is never overwritten)
    pub stack_file_created: bool,
    pub backup: Option<PathBuf>,
    pub settings_file: PathBuf,
}

pub async fn init(runner: &dyn CommandRunner, options: &InitOptions) -> Result<InitReport> {
    let work_dir = &options.work_dir;
    info!("Initializing Pulumi stack in: {}", work_dir.display());
    fs::create_dir_all(work_dir)?;

    let project_file = work_dir.join("Pulumi.yaml");
    let backup = if project_file.exists() {
        let backup = work_dir.join(BACKUP_FILE_NAME);
        fs::rename(&project_file, &backup)?;
        warn!(
            "Found existing Pulumi.yaml, temporarily backed up to {}",
            backup.display()
        );
        Some(backup)
    } else {
        None
    };

    match scaffold(runner, options).await {
        Ok(mut report) => {
            report.backup = backup;
            info!("Stack '{}' is ready to use!", options.stack_name);
            Ok(report)
        }
        Err(e) => {
            if let Some(backup) = backup.filter(|b| b.exists()) {
                restore_backup(&backup, &project_file);
            }
            Err(e)
        }
    }
}

async fn scaffold(runner: &dyn CommandRunner, options: &InitOptions) -> Result<InitReport> {
    let work_dir = &options.work_dir;
    let stack = options.stack_name.as_str();
    let pulumi = Pulumi::new(runner, work_dir, ToolEnvironment::new());
    let renderer = TemplateRenderer::new()?;

    info!("Logging in to Pulumi backend...");
    if let LoginOutcome::Failed(output) = pulumi.login(INIT_LOGIN_ATTEMPTS).await? {
        let message = interpret_pulumi_error(output.error_text());
        return Err(pulumi_failure(
            &["login", "file://", "--non-interactive"],
            output.code,
            message,
        ));
    }
    info!("Successfully logged in to Pulumi backend");

    let project_name = project_name_for(stack);
    fs::write(work_dir.join("Pulumi.yaml"), renderer.project_file(stack)?)?;
    info!("Created Pulumi.yaml with project name: {}", project_name);

    info!("Creating new stack: {}...", stack);
    let created = pulumi.stack_init(stack).await?;
    let stack_created = if created.success() {
        info!("Created stack: {}", stack);
        true
    } else if created.stderr.contains("already exists") {
        warn!("Stack '{}' already exists. Selecting it...", stack);
        let selected = pulumi.stack_select(stack).await?;
        let invocation = pulumi.invocation(&["stack", "select", stack]);
        let message = interpret_pulumi_error(selected.error_text());
        selected.check(&invocation, message)?;
        info!("Selected stack: {}", stack);
        false
    } else {
        let message = interpret_pulumi_error(created.error_text());
        return Err(pulumi_failure(
            &["stack", "init", stack, "--non-interactive"],
            created.code,
            message,
        ));
    };

    let stack_file = work_dir.join(format!("Pulumi.{}.yaml", stack));
    let stack_file_created = !stack_file.exists();
    if stack_file_created {
        fs::write(&stack_file, renderer.stack_file(stack)?)?;
        info!("Created stack configuration file: Pulumi.{}.yaml", stack);
    }

    let mut settings = options.settings.clone();
    settings.stack_name = Some(stack.to_string());
    let settings_file = settings.save(work_dir)?;

    Ok(InitReport {
        project_name,
        stack_created,
        stack_file_created,
        backup: None,
        settings_file,
    })
}

fn restore_backup(backup: &Path, project_file: &Path) {
    match fs::rename(backup, project_file) {
        Ok(()) => warn!("Restored original Pulumi.yaml from backup"),
        Err(e) => warn!(
            "Could not restore {} to {}: {}",
            backup.display(),
            project_file.display(),
            e
        ),
    }
}
