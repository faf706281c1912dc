//! Pulumi and gcloud orchestration for BLI
//!
//! This crate turns stack commands into `pulumi` and `gcloud` subprocess
//! calls:
//! - [`runner`]: the [`CommandRunner`] seam and the tokio-backed [`ProcessRunner`]
//! - [`pulumi`] and [`gcloud`]: one method per external command line
//! - [`diagnostics`] and [`colorize`]: reading Pulumi output
//! - [`state`]: pruning resources that no longer exist from stack state
//! - [`graph`]: DOT parsing and tree rendering
//! - [`operations`]: init, preview, deploy, destroy and graph

pub mod colorize;
pub mod diagnostics;
pub mod gcloud;
pub mod graph;
pub mod operations;
pub mod pulumi;
pub mod runner;
pub mod state;

pub use colorize::colorize_pulumi_output;
pub use diagnostics::{interpret_pulumi_error, simplify_resource_error, Diagnosis, DiagnosisKind};
pub use graph::{GraphFormat, ResourceGraph};
pub use operations::{
    AssumeYes, Confirm, DeployOutcome, DestroyOutcome, GraphOptions, GraphReport, InitOptions,
    InitReport, Recovery, StackContext,
};
pub use pulumi::{LoginOutcome, Pulumi, UpMode};
pub use runner::{CommandOutput, CommandRunner, Invocation, OutputMode, ProcessRunner};
