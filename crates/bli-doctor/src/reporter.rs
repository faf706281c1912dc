//! Diagnostic reporter module
//!
//! Formats dependency check results as colored text or JSON.

use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};

use crate::checker::{ToolState, ToolStatus};
use crate::platform::PlatformInfo;
use crate::{DiagnosticResult, OverallStatus};

/// Output format for diagnostic results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable colored output
    #[default]
    Human,
    /// JSON format for machine consumption
    Json,
}

/// Diagnostic result reporter
pub struct DiagnosticReporter {
    verbose: bool,
}

impl DiagnosticReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn format(&self, result: &DiagnosticResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Human => self.format_human(result),
            OutputFormat::Json => self.format_json(result),
        }
    }

    fn format_human(&self, result: &DiagnosticResult) -> String {
        let mut output = String::new();
        output.push_str(&self.format_header(&result.platform));
        output.push('\n');

        for status in &result.tools {
            output.push_str(&self.format_tool_status(status));
        }

        output.push_str(&self.format_summary(&result.overall_status));
        output
    }

    fn format_header(&self, platform: &PlatformInfo) -> String {
        let mut header = String::new();
        header.push_str(&format!("{}\n", "Checking dependencies...".bold()));
        if self.verbose {
            header.push_str(&format!("Platform: {} ({})\n", platform.os, platform.arch));
            if !platform.package_managers.is_empty() {
                let managers: Vec<String> = platform
                    .package_managers
                    .iter()
                    .map(|pm| pm.to_string())
                    .collect();
                header.push_str(&format!("Package managers: {}\n", managers.join(", ")));
            }
        }
        header
    }

    fn format_tool_status(&self, status: &ToolStatus) -> String {
        let name = status.tool.name;
        let mut output = match &status.state {
            ToolState::Available => {
                let version = status
                    .version
                    .as_deref()
                    .map(|v| format!(" ({})", v).dimmed().to_string())
                    .unwrap_or_default();
                format!("{} {} is installed{}\n", "✓".green(), name, version)
            }
            ToolState::Missing => format!("{} {} is not installed.\n", "✗".red(), name),
            ToolState::VersionTooOld { found, required } => format!(
                "{} {} {} is too old (required: {}+)\n",
                "⚠".yellow(),
                name,
                found,
                required
            ),
            ToolState::CheckFailed { error } => format!(
                "{} {} is installed but not working: {}\n",
                "✗".red(),
                name,
                error.yellow()
            ),
        };

        if self.verbose {
            output.push_str(&format!("    {} {}\n", "→".dimmed(), status.tool.description));
            if let Some(path) = &status.path {
                output.push_str(&format!("    {} {}\n", "→".dimmed(), path.display()));
            }
            output.push_str(&format!(
                "    {} checked in {:?}\n",
                "→".dimmed(),
                status.check_duration
            ));
        }
        output
    }

    fn format_summary(&self, status: &OverallStatus) -> String {
        match status {
            OverallStatus::Ready => String::new(),
            OverallStatus::MissingRequired(_) => {
                "Please run 'bli init' to set up your environment.\n".to_string()
            }
        }
    }

    fn format_json(&self, result: &DiagnosticResult) -> String {
        let json_result = JsonDiagnosticResult::from(result);
        serde_json::to_string_pretty(&json_result)
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e))
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new(false)
    }
}

/// JSON-serializable diagnostic result
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnosticResult {
    pub platform: JsonPlatformInfo,
    pub tools: Vec<JsonToolStatus>,
    pub overall_status: String,
    pub missing_required_count: usize,
}

impl From<&DiagnosticResult> for JsonDiagnosticResult {
    fn from(result: &DiagnosticResult) -> Self {
        let (overall_status, missing) = match &result.overall_status {
            OverallStatus::Ready => ("ready", 0),
            OverallStatus::MissingRequired(n) => ("missing_required", *n),
        };
        Self {
            platform: JsonPlatformInfo::from(&result.platform),
            tools: result.tools.iter().map(JsonToolStatus::from).collect(),
            overall_status: overall_status.to_string(),
            missing_required_count: missing,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonPlatformInfo {
    pub os: String,
    pub arch: String,
    pub package_managers: Vec<String>,
}

impl From<&PlatformInfo> for JsonPlatformInfo {
    fn from(platform: &PlatformInfo) -> Self {
        Self {
            os: platform.os.to_string(),
            arch: platform.arch.to_string(),
            package_managers: platform
                .package_managers
                .iter()
                .map(|pm| pm.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonToolStatus {
    pub id: String,
    pub name: String,
    pub description: String,
    pub state: String,
    pub version: Option<String>,
    pub path: Option<String>,
    pub required: bool,
    pub docs_url: String,
    pub check_duration_ms: u64,
}

impl From<&ToolStatus> for JsonToolStatus {
    fn from(status: &ToolStatus) -> Self {
        Self {
            id: status.tool.id.to_string(),
            name: status.tool.name.to_string(),
            description: status.tool.description.to_string(),
            state: match &status.state {
                ToolState::Available => "available".to_string(),
                ToolState::Missing => "missing".to_string(),
                ToolState::VersionTooOld { found, required } => {
                    format!("version_too_old:{}->{}", found, required)
                }
                ToolState::CheckFailed { error } => format!("check_failed:{}", error),
            },
            version: status.version.clone(),
            path: status.path.as_ref().map(|p| p.display().to_string()),
            required: !status.tool.optional,
            docs_url: status.tool.docs_url.to_string(),
            check_duration_ms: status.check_duration.as_millis() as u64,
        }
    }
}
