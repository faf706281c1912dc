//! BLI Doctor - dependency checking and installation
//!
//! BLI drives two external executables: the Pulumi CLI and the Google Cloud
//! SDK. This crate checks that both are present and working, and installs
//! Pulumi when it is missing.
//!
//! # Example
//!
//! ```rust,no_run
//! use bli_doctor::{Doctor, OutputFormat};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let doctor = Doctor::new();
//!     let result = doctor.check().await;
//!     println!("{}", result.format(OutputFormat::Human));
//! }
//! ```

mod checker;
mod installer;
mod platform;
mod registry;
mod reporter;
mod tool;

pub use checker::{ToolChecker, ToolState, ToolStatus};
pub use installer::{InstallResult, InstallSummary, ToolInstaller};
pub use platform::{detect_platform, Arch, PackageManager, Platform, PlatformInfo};
pub use registry::{ToolRegistry, TOOL_REGISTRY};
pub use reporter::{DiagnosticReporter, OutputFormat};
pub use tool::{InstallInstruction, InstallMethod, ToolDefinition};

use tracing::info;

/// Main entry point for dependency checks and installation
pub struct Doctor {
    checker: ToolChecker,
}

impl Doctor {
    pub fn new() -> Self {
        Self {
            checker: ToolChecker::new(),
        }
    }

    /// Use a specific checker, e.g. one with a PATH override
    pub fn with_checker(checker: ToolChecker) -> Self {
        Self { checker }
    }

    /// Check every registered tool
    pub async fn check(&self) -> DiagnosticResult {
        let tools: Vec<&'static ToolDefinition> = ToolRegistry::all().iter().collect();
        let statuses = self.checker.check_all(&tools).await;
        DiagnosticResult::new(detect_platform(), statuses)
    }

    /// Check every registered tool and install the missing ones
    pub async fn install(&self) -> InstallSummary {
        info!("Setting up BLI environment...");
        let result = self.check().await;
        let installer = ToolInstaller::new(self.checker.clone());
        let results = installer.install_missing(&result.tools).await;
        ToolInstaller::summarize_results(&results)
    }
}

impl Default for Doctor {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a dependency check
#[derive(Debug)]
pub struct DiagnosticResult {
    pub platform: PlatformInfo,
    pub tools: Vec<ToolStatus>,
    pub overall_status: OverallStatus,
}

impl DiagnosticResult {
    pub fn new(platform: PlatformInfo, tools: Vec<ToolStatus>) -> Self {
        let missing = tools
            .iter()
            .filter(|s| !s.tool.optional && !s.is_available())
            .count();
        let overall_status = if missing == 0 {
            OverallStatus::Ready
        } else {
            OverallStatus::MissingRequired(missing)
        };
        Self {
            platform,
            tools,
            overall_status,
        }
    }

    pub fn format(&self, format: OutputFormat) -> String {
        DiagnosticReporter::new(false).format(self, format)
    }

    pub fn format_verbose(&self, format: OutputFormat) -> String {
        DiagnosticReporter::new(true).format(self, format)
    }

    pub fn exit_code(&self) -> i32 {
        match self.overall_status {
            OverallStatus::Ready => 0,
            OverallStatus::MissingRequired(_) => 1,
        }
    }

    /// Check if all required tools are available
    pub fn is_ready(&self) -> bool {
        self.overall_status == OverallStatus::Ready
    }
}

/// Overall status of the dependency check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallStatus {
    /// All required tools available
    Ready,
    /// Some required tools are missing or broken
    MissingRequired(usize),
}
