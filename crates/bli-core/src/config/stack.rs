//! Per-invocation stack configuration

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ProxySettings, WorkspaceSettings, INFERRED_STACK_NAME};
use crate::error::{Error, Result};

/// Project flavour exposed to templates as `project_type`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectType {
    #[default]
    #[serde(rename = "bi-stg")]
    Staging,
    #[serde(rename = "bi-srv")]
    Service,
}

impl ProjectType {
    /// Select the project type from the `--stg` / `--srv` flags
    pub fn from_flags(stg: bool, srv: bool) -> Result<Self> {
        match (stg, srv) {
            (true, true) => Err(Error::ConflictingProjectType),
            (_, true) => Ok(Self::Service),
            _ => Ok(Self::Staging),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staging => "bi-stg",
            Self::Service => "bi-srv",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw stack options as given on the command line
#[derive(Debug, Clone, Default)]
pub struct StackOptions {
    pub stack_name: Option<String>,
    pub project_id: Option<String>,
    pub proxy_address: Option<String>,
    pub proxy_port: Option<u16>,
    pub use_local_auth: bool,
    pub no_proxy: bool,
    pub stg: bool,
    pub srv: bool,
}

/// Fully resolved configuration for one stack command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    pub stack_name: String,
    pub project_id: String,
    pub proxy: ProxySettings,
    pub use_local_auth: bool,
    pub no_proxy: bool,
    pub project_type: ProjectType,
    pub location: String,
    pub environment: String,
}

impl StackConfig {
    /// Resolve command-line options against bli.yaml and defaults
    pub fn from_cli(
        options: &StackOptions,
        work_dir: &Path,
        settings: &WorkspaceSettings,
    ) -> Result<Self> {
        let project_type = ProjectType::from_flags(options.stg, options.srv)?;
        let stack_name = resolve_stack_name(options.stack_name.as_deref(), work_dir, settings)?;

        let project_id = options
            .project_id
            .clone()
            .or_else(|| settings.project_id.clone())
            .filter(|id| !id.trim().is_empty())
            .ok_or(Error::ProjectIdRequired)?;

        let proxy = ProxySettings {
            address: options
                .proxy_address
                .clone()
                .unwrap_or_else(|| settings.proxy.address.clone()),
            port: options.proxy_port.unwrap_or(settings.proxy.port),
        };

        Ok(Self {
            stack_name,
            project_id,
            proxy,
            use_local_auth: options.use_local_auth,
            no_proxy: options.no_proxy,
            project_type,
            location: settings.location.clone(),
            environment: settings.environment.clone(),
        })
    }
}

/// Determine the stack to operate on
///
/// An explicit name wins, then `stack_name` from bli.yaml, then `bli-stack`
/// when the work directory already contains a Pulumi.yaml.
pub fn resolve_stack_name(
    provided: Option<&str>,
    work_dir: &Path,
    settings: &WorkspaceSettings,
) -> Result<String> {
    if let Some(name) = provided.filter(|n| !n.is_empty()) {
        return Ok(name.to_string());
    }
    if let Some(name) = settings.stack_name.as_deref().filter(|n| !n.is_empty()) {
        return Ok(name.to_string());
    }
    if work_dir.join("Pulumi.yaml").exists() {
        return Ok(INFERRED_STACK_NAME.to_string());
    }
    Err(Error::StackNameRequired)
}
