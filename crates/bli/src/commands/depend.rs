//! Depend command - check and install pulumi and gcloud

use anyhow::{bail, Result};
use bli_doctor::{DiagnosticResult, Doctor, OutputFormat};

use crate::cli::DependArgs;
use crate::output;

pub async fn run(args: DependArgs) -> Result<()> {
    let doctor = Doctor::new();
    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    if args.check_only {
        let result = doctor.check().await;
        if args.verbose {
            println!("{}", result.format_verbose(format));
        } else {
            println!("{}", result.format(format));
        }
        return check_outcome(&result);
    }

    output::header("Installing dependencies");
    let summary = doctor.install().await;
    print!("{}", summary.format());

    if !summary.all_succeeded() {
        bail!("Failed to install all dependencies");
    }
    if args.json {
        println!("{}", doctor.check().await.format(format));
    }
    output::success("All dependencies are installed");
    Ok(())
}

/// `--check-only` result, carrying the report's exit code on failure
fn check_outcome(result: &DiagnosticResult) -> Result<()> {
    match result.exit_code() {
        0 => Ok(()),
        code => Err(bli_core::Error::tool_failed(
            "bli",
            "bli depend --check-only",
            code,
            "Some required dependencies are missing. Run 'bli depend' to install them.",
        )
        .into()),
    }
}
