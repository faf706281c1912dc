//! Tool definition types
//!
//! Describes the external executables BLI drives: how to detect them, how to
//! read their version and how to install them on each platform.

use crate::platform::{PackageManager, Platform};

/// Definition of an external tool BLI depends on
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    /// Unique identifier (e.g., "pulumi")
    pub id: &'static str,

    /// Human-readable name (e.g., "Pulumi CLI")
    pub name: &'static str,

    /// One-line summary shown in verbose and JSON reports
    pub description: &'static str,

    /// Executable name looked up on PATH
    pub command: &'static str,

    /// Arguments that print the version
    pub version_args: &'static [&'static str],

    /// Tried when the version command fails, e.g. a broken plugin cache
    pub fallback_args: Option<&'static [&'static str]>,

    /// Minimum required version (semver format)
    pub min_version: Option<&'static str>,

    /// Installation instructions per platform; empty means manual installation only
    pub install_instructions: &'static [InstallInstruction],

    /// Directory under the home directory the installer drops binaries into
    pub install_bin_dir: Option<&'static str>,

    /// Command run after installing to confirm the tool works
    pub verify_args: &'static [&'static str],

    /// Documentation / manual installation URL
    pub docs_url: &'static str,

    /// Whether this tool is optional (nice-to-have vs required)
    pub optional: bool,
}

impl ToolDefinition {
    /// Whether BLI can install this tool itself
    pub fn auto_installable(&self) -> bool {
        !self.install_instructions.is_empty()
    }

    /// Get the installation instruction for a platform and the available package managers
    ///
    /// Instructions that need a package manager are only chosen when that
    /// manager is available; otherwise the platform's plain instruction wins.
    pub fn instruction_for(
        &self,
        platform: Platform,
        package_managers: &[PackageManager],
    ) -> Option<&InstallInstruction> {
        let for_platform = || {
            self.install_instructions
                .iter()
                .filter(move |i| i.platform == platform)
        };

        for_platform()
            .find(|i| {
                i.package_manager
                    .is_some_and(|pm| package_managers.contains(&pm))
            })
            .or_else(|| for_platform().find(|i| i.package_manager.is_none()))
    }
}

/// How an installation is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMethod {
    /// Shell pipeline, run through `sh -c`
    Shell(&'static str),
    /// Direct program invocation
    Exec {
        program: &'static str,
        args: &'static [&'static str],
    },
}

impl std::fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shell(script) => write!(f, "{}", script),
            Self::Exec { program, args } => {
                write!(f, "{}", program)?;
                for arg in *args {
                    if arg.contains(' ') {
                        write!(f, " \"{}\"", arg)?;
                    } else {
                        write!(f, " {}", arg)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Installation instruction for a specific platform
#[derive(Debug, Clone)]
pub struct InstallInstruction {
    pub platform: Platform,
    /// Package manager required by this instruction, if any
    pub package_manager: Option<PackageManager>,
    pub method: InstallMethod,
    /// Logged before the install runs, e.g. where binaries end up
    pub notes: Option<&'static str>,
}
