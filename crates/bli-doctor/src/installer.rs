//! Tool installer module
//!
//! Installs missing tools with the instruction that fits the current
//! platform. Only Pulumi can be installed automatically; the Google Cloud SDK
//! has to be installed by hand.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{anyhow, Context, Result};
use owo_colors::OwoColorize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::checker::{ToolChecker, ToolStatus};
use crate::platform::{detect_platform, PlatformInfo};
use crate::tool::{InstallInstruction, InstallMethod, ToolDefinition};

/// Result of an installation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallResult {
    /// Tool was already usable
    AlreadyInstalled,
    /// Installation succeeded and was verified
    Installed,
    /// Tool must be installed by hand
    Manual {
        /// Where the installation instructions live
        url: String,
    },
    /// Installation failed
    Failed { error: String },
}

impl InstallResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::AlreadyInstalled | Self::Installed)
    }
}

/// Tool installer that manages automated installation
pub struct ToolInstaller {
    platform: PlatformInfo,
    checker: ToolChecker,
    home: Option<PathBuf>,
}

impl ToolInstaller {
    pub fn new(checker: ToolChecker) -> Self {
        Self {
            platform: detect_platform(),
            checker,
            home: bli_core::get_home_dir().ok(),
        }
    }

    /// Override the detected platform
    pub fn with_platform(mut self, platform: PlatformInfo) -> Self {
        self.platform = platform;
        self
    }

    pub fn platform(&self) -> &PlatformInfo {
        &self.platform
    }

    /// Install every tool whose status is not available
    pub async fn install_missing(&self, statuses: &[ToolStatus]) -> Vec<(String, InstallResult)> {
        let mut results = Vec::new();
        for status in statuses {
            let result = if status.is_available() {
                InstallResult::AlreadyInstalled
            } else {
                self.install(status.tool).await
            };
            results.push((status.tool.name.to_string(), result));
        }
        results
    }

    /// Install a single tool
    pub async fn install(&self, tool: &ToolDefinition) -> InstallResult {
        if !tool.auto_installable() {
            warn!("{} is not installed and cannot be installed automatically", tool.name);
            return InstallResult::Manual {
                url: tool.docs_url.to_string(),
            };
        }

        let Some(instruction) = self.select_instruction(tool) else {
            return InstallResult::Failed {
                error: format!("Unsupported platform: {}", self.platform.os),
            };
        };

        info!("Installing {}...", tool.name);
        if let Some(notes) = instruction.notes {
            info!("{}", notes);
        }
        if let Err(e) = self.execute_install(instruction).await {
            return InstallResult::Failed {
                error: format!("{:#}. Install manually from {}", e, tool.docs_url),
            };
        }

        self.extend_path(tool);

        match self.checker.verify(tool).await {
            Ok(()) => {
                info!("{} installed successfully", tool.name);
                InstallResult::Installed
            }
            Err(e) => InstallResult::Failed {
                error: format!(
                    "{} installation verification failed: {}. You may need to restart your terminal or add it to your PATH manually.",
                    tool.name, e
                ),
            },
        }
    }

    /// Select the installation instruction for the current platform
    pub fn select_instruction<'a>(&self, tool: &'a ToolDefinition) -> Option<&'a InstallInstruction> {
        tool.instruction_for(self.platform.os, &self.platform.package_managers)
    }

    /// Prepend the tool's install directory to PATH for the rest of this process
    fn extend_path(&self, tool: &ToolDefinition) {
        let (Some(home), Some(bin_dir)) = (&self.home, tool.install_bin_dir) else {
            return;
        };
        let dir = home.join(bin_dir);
        if !dir.is_dir() {
            return;
        }

        let current = std::env::var_os("PATH").unwrap_or_default();
        let mut paths = vec![dir.clone()];
        paths.extend(std::env::split_paths(&current).filter(|p| *p != dir));
        match std::env::join_paths(paths) {
            Ok(joined) => {
                std::env::set_var("PATH", &joined);
                debug!("Added {} to PATH", dir.display());
            }
            Err(e) => warn!("Could not add {} to PATH: {}", dir.display(), e),
        }
    }

    async fn execute_install(&self, instruction: &InstallInstruction) -> Result<()> {
        let mut command = match instruction.method {
            InstallMethod::Shell(script) => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(script);
                cmd
            }
            InstallMethod::Exec { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
        };

        info!("Running: {}", instruction.method);

        let status = command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("Failed to spawn installation process")?
            .wait()
            .await
            .context("Installation process failed")?;

        if status.success() {
            Ok(())
        } else {
            Err(anyhow!(
                "Installation command failed with exit code: {:?}",
                status.code()
            ))
        }
    }

    pub fn summarize_results(results: &[(String, InstallResult)]) -> InstallSummary {
        let mut summary = InstallSummary {
            installed: 0,
            already_installed: 0,
            failed: 0,
            results: results.to_vec(),
        };
        for (_, result) in results {
            match result {
                InstallResult::Installed => summary.installed += 1,
                InstallResult::AlreadyInstalled => summary.already_installed += 1,
                InstallResult::Manual { .. } | InstallResult::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

/// Summary of installation results
#[derive(Debug, Clone)]
pub struct InstallSummary {
    pub installed: usize,
    pub already_installed: usize,
    pub failed: usize,
    pub results: Vec<(String, InstallResult)>,
}

impl InstallSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Human-readable per-tool lines
    pub fn format(&self) -> String {
        let mut output = String::new();
        for (name, result) in &self.results {
            match result {
                InstallResult::AlreadyInstalled => {
                    output.push_str(&format!("{} {} is already installed\n", "✓".green(), name));
                }
                InstallResult::Installed => {
                    output.push_str(&format!("{} {} installed successfully\n", "✓".green(), name));
                }
                InstallResult::Manual { url } => {
                    output.push_str(&format!("{} {} is not installed.\n", "✗".red(), name));
                    output.push_str(&format!(
                        "  {}\n  {}\n",
                        format!("Please install {} manually by following the instructions at:", name)
                            .yellow(),
                        url
                    ));
                }
                InstallResult::Failed { error } => {
                    output.push_str(&format!(
                        "{} Failed to install {}: {}\n",
                        "✗".red(),
                        name,
                        error
                    ));
                }
            }
        }
        if self.all_succeeded() {
            output.push_str(&format!(
                "{}\n",
                "All dependencies are installed successfully!".green()
            ));
        }
        output
    }
}
