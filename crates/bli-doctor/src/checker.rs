//! Parallel tool checking module
//!
//! Checks that each registered tool is on PATH and answers its version
//! command. Tools are checked concurrently with `join_all`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use futures::future::join_all;
use regex::Regex;
use tokio::process::Command;
use tracing::debug;

/// Pre-compiled regex for extracting version numbers from command output
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v?(\d+\.\d+(?:\.\d+)?)").expect("version regex is valid"));

use crate::tool::ToolDefinition;

/// Tool checker that runs availability and version checks
#[derive(Debug, Clone)]
pub struct ToolChecker {
    /// Timeout for each version command
    timeout: Duration,
    /// PATH override; `None` searches the process PATH
    search_path: Option<OsString>,
}

impl ToolChecker {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            search_path: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::new()
        }
    }

    /// Look tools up in `path` instead of the process PATH
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check all tools in parallel
    pub async fn check_all(&self, tools: &[&'static ToolDefinition]) -> Vec<ToolStatus> {
        let futures: Vec<_> = tools.iter().map(|tool| self.check_tool(tool)).collect();
        join_all(futures).await
    }

    /// Check a single tool
    pub async fn check_tool(&self, tool: &'static ToolDefinition) -> ToolStatus {
        let start = Instant::now();

        let Some(path) = self.locate(tool.command) else {
            debug!("{} not found on PATH", tool.command);
            return ToolStatus {
                tool,
                state: ToolState::Missing,
                version: None,
                path: None,
                check_duration: start.elapsed(),
            };
        };

        let mut outcome = self.run_command(&path, tool.version_args).await;
        if outcome.is_err() {
            if let Some(fallback) = tool.fallback_args {
                debug!(
                    "{} {} failed, trying {}",
                    tool.command,
                    tool.version_args.join(" "),
                    fallback.join(" ")
                );
                outcome = self.run_command(&path, fallback).await;
            }
        }

        let (state, version) = match outcome {
            Ok(text) => {
                let version = parse_version(&text);
                let state = match (&version, tool.min_version) {
                    (Some(v), Some(min)) if !version_satisfies(v, min) => ToolState::VersionTooOld {
                        found: v.clone(),
                        required: min.to_string(),
                    },
                    _ => ToolState::Available,
                };
                (state, version)
            }
            Err(error) => (ToolState::CheckFailed { error }, None),
        };

        ToolStatus {
            tool,
            state,
            version,
            path: Some(path),
            check_duration: start.elapsed(),
        }
    }

    /// Run the tool's verify command; used after installation
    pub async fn verify(&self, tool: &ToolDefinition) -> Result<(), String> {
        let path = self
            .locate(tool.command)
            .ok_or_else(|| format!("{} not found in PATH", tool.command))?;
        self.run_command(&path, tool.verify_args).await.map(|_| ())
    }

    /// Resolve an executable against the configured search path
    pub fn locate(&self, command: &str) -> Option<PathBuf> {
        match &self.search_path {
            Some(paths) => which::which_in(command, Some(paths), Path::new(".")).ok(),
            None => which::which(command).ok(),
        }
    }

    /// Run `path args`, returning stdout (or stderr when stdout is empty) on success
    async fn run_command(&self, path: &Path, args: &[&str]) -> Result<String, String> {
        let result = tokio::time::timeout(self.timeout, async {
            Command::new(path).args(args).kill_on_drop(true).output().await
        })
        .await;

        match result {
            Ok(Ok(output)) if output.status.success() => {
                let text = if output.stdout.is_empty() {
                    String::from_utf8_lossy(&output.stderr).into_owned()
                } else {
                    String::from_utf8_lossy(&output.stdout).into_owned()
                };
                Ok(text)
            }
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let first = stderr.lines().next().unwrap_or("").trim().to_string();
                Err(if first.is_empty() {
                    format!("exited with {}", output.status)
                } else {
                    first
                })
            }
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {:?}", self.timeout)),
        }
    }
}

impl Default for ToolChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract a version number from command output
///
/// Handles `v3.100.0` (pulumi) and `Google Cloud SDK 460.0.0` (gcloud).
fn parse_version(text: &str) -> Option<String> {
    VERSION_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Check if actual version satisfies minimum requirement
///
/// Unparseable versions are accepted rather than reported as too old.
fn version_satisfies(actual: &str, required: &str) -> bool {
    let normalize = |v: &str| {
        if v.matches('.').count() == 1 {
            format!("{}.0", v)
        } else {
            v.to_string()
        }
    };
    match (
        semver::Version::parse(&normalize(actual)),
        semver::Version::parse(&normalize(required)),
    ) {
        (Ok(actual_ver), Ok(required_ver)) => actual_ver >= required_ver,
        _ => true,
    }
}

/// Status of a tool after checking
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub tool: &'static ToolDefinition,
    pub state: ToolState,
    /// Detected version (if available)
    pub version: Option<String>,
    /// Resolved executable path
    pub path: Option<PathBuf>,
    /// How long the check took
    pub check_duration: Duration,
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        self.state == ToolState::Available
    }
}

/// State of a tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolState {
    /// Tool is available and meets requirements
    Available,
    /// Tool is not installed
    Missing,
    /// Tool version is too old
    VersionTooOld { found: String, required: String },
    /// Tool is on PATH but its version command failed
    CheckFailed { error: String },
}
