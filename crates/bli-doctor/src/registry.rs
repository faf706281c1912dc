//! Tool registry
//!
//! Static registry of the executables BLI shells out to.

use crate::platform::{PackageManager, Platform};
use crate::tool::{InstallInstruction, InstallMethod, ToolDefinition};

/// Pulumi's install script, piped to a shell
pub const PULUMI_INSTALL_SCRIPT: &str = "curl -fsSL https://get.pulumi.com | sh";

/// PowerShell one-liner used on Windows without Chocolatey
pub const PULUMI_INSTALL_POWERSHELL: &str = "(New-Object System.Net.WebClient).DownloadString('https://get.pulumi.com/install.ps1') | powershell -Command -";

/// Static registry of all known tools
pub static TOOL_REGISTRY: &[ToolDefinition] = &[
    ToolDefinition {
        id: "pulumi",
        name: "Pulumi CLI",
        description: "Infrastructure-as-code engine",
        command: "pulumi",
        version_args: &["version"],
        fallback_args: Some(&["about"]),
        min_version: Some("3.0.0"),
        install_instructions: &[
            InstallInstruction {
                platform: Platform::Linux,
                package_manager: None,
                method: InstallMethod::Shell(PULUMI_INSTALL_SCRIPT),
                notes: Some("Installs into ~/.pulumi/bin"),
            },
            InstallInstruction {
                platform: Platform::MacOS,
                package_manager: Some(PackageManager::Homebrew),
                method: InstallMethod::Exec {
                    program: "brew",
                    args: &["install", "pulumi"],
                },
                notes: None,
            },
            InstallInstruction {
                platform: Platform::MacOS,
                package_manager: None,
                method: InstallMethod::Shell(PULUMI_INSTALL_SCRIPT),
                notes: Some("Installs into ~/.pulumi/bin"),
            },
            InstallInstruction {
                platform: Platform::Windows,
                package_manager: Some(PackageManager::Chocolatey),
                method: InstallMethod::Exec {
                    program: "choco",
                    args: &["install", "pulumi", "-y"],
                },
                notes: None,
            },
            InstallInstruction {
                platform: Platform::Windows,
                package_manager: None,
                method: InstallMethod::Exec {
                    program: "powershell",
                    args: &["-Command", PULUMI_INSTALL_POWERSHELL],
                },
                notes: Some("Installs into %USERPROFILE%\\.pulumi\\bin"),
            },
        ],
        install_bin_dir: Some(".pulumi/bin"),
        verify_args: &["about"],
        docs_url: "https://www.pulumi.com/docs/get-started/install/",
        optional: false,
    },
    ToolDefinition {
        id: "gcloud",
        name: "Google Cloud SDK",
        description: "Google Cloud Platform command-line interface",
        command: "gcloud",
        version_args: &["version"],
        fallback_args: None,
        min_version: None,
        install_instructions: &[],
        install_bin_dir: None,
        verify_args: &["version"],
        docs_url: "https://cloud.google.com/sdk/docs/install",
        optional: false,
    },
];

/// Tool registry providing lookup methods
pub struct ToolRegistry;

impl ToolRegistry {
    /// All registered tools, in check order
    pub fn all() -> &'static [ToolDefinition] {
        TOOL_REGISTRY
    }

    pub fn get(id: &str) -> Option<&'static ToolDefinition> {
        TOOL_REGISTRY.iter().find(|t| t.id == id)
    }

    /// Tools that are not optional
    pub fn required() -> Vec<&'static ToolDefinition> {
        TOOL_REGISTRY.iter().filter(|t| !t.optional).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_pulumi_and_gcloud() {
        let ids: Vec<_> = ToolRegistry::all().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["pulumi", "gcloud"]);
        assert_eq!(ToolRegistry::required().len(), 2);
    }

    #[test]
    fn test_pulumi_definition() {
        let pulumi = ToolRegistry::get("pulumi").unwrap();
        assert_eq!(pulumi.version_args, &["version"]);
        assert_eq!(pulumi.fallback_args, Some(&["about"][..]));
        assert_eq!(pulumi.verify_args, &["about"]);
        assert!(pulumi.auto_installable());
        assert_eq!(pulumi.install_bin_dir, Some(".pulumi/bin"));
    }

    #[test]
    fn test_pulumi_linux_uses_install_script() {
        let pulumi = ToolRegistry::get("pulumi").unwrap();
        let inst = pulumi.instruction_for(Platform::Linux, &[]).unwrap();
        assert_eq!(inst.method, InstallMethod::Shell(PULUMI_INSTALL_SCRIPT));
        assert_eq!(inst.notes, Some("Installs into ~/.pulumi/bin"));
    }

    #[test]
    fn test_pulumi_macos_prefers_brew() {
        let pulumi = ToolRegistry::get("pulumi").unwrap();
        let with_brew = pulumi
            .instruction_for(Platform::MacOS, &[PackageManager::Homebrew])
            .unwrap();
        assert_eq!(with_brew.method.to_string(), "brew install pulumi");

        let without = pulumi.instruction_for(Platform::MacOS, &[]).unwrap();
        assert_eq!(without.method, InstallMethod::Shell(PULUMI_INSTALL_SCRIPT));
    }

    #[test]
    fn test_pulumi_windows_instructions() {
        let pulumi = ToolRegistry::get("pulumi").unwrap();
        let choco = pulumi
            .instruction_for(Platform::Windows, &[PackageManager::Chocolatey])
            .unwrap();
        assert_eq!(choco.method.to_string(), "choco install pulumi -y");

        let ps = pulumi.instruction_for(Platform::Windows, &[]).unwrap();
        assert!(matches!(
            ps.method,
            InstallMethod::Exec {
                program: "powershell",
                ..
            }
        ));
    }

    #[test]
    fn test_gcloud_is_manual() {
        let gcloud = ToolRegistry::get("gcloud").unwrap();
        assert!(!gcloud.auto_installable());
        assert_eq!(gcloud.docs_url, "https://cloud.google.com/sdk/docs/install");
    }
}
