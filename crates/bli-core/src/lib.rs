//! # bli-core
//!
//! Core library for the BLI CLI providing:
//! - Workspace settings (bli.yaml) and per-invocation stack configuration
//! - The environment overlay passed to every `pulumi`/`gcloud` subprocess
//! - Tera rendering of the user's Pulumi.yaml and the `init` scaffolding
//! - Build directory preparation and lock file cleanup

pub mod config;
pub mod env;
pub mod error;
pub mod locks;
mod pattern;
pub mod templates;
pub mod workspace;

pub use config::{
    resolve_stack_name, ProjectType, ProxySettings, StackConfig, StackOptions, WorkspaceSettings,
};
pub use env::{get_home_dir, ToolEnvironment};
pub use error::{Error, Result};
pub use locks::ClearOutcome;
pub use templates::{RenderContext, TemplateRenderer};
pub use workspace::{BuildWorkspace, RenderFailure};
