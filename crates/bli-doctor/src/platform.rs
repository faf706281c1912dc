//! Platform detection module
//!
//! Detects the operating system, architecture and the package managers the
//! Pulumi installer can use.

/// Operating system platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    MacOS,
    Linux,
    Windows,
    Unknown,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MacOS => write!(f, "macOS"),
            Self::Linux => write!(f, "Linux"),
            Self::Windows => write!(f, "Windows"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    Aarch64,
    Unknown,
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X86_64 => write!(f, "x86_64"),
            Self::Aarch64 => write!(f, "aarch64"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Package managers used by install instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    /// Homebrew (macOS)
    Homebrew,
    /// Chocolatey (Windows)
    Chocolatey,
}

impl PackageManager {
    /// Executable that signals the manager is available
    pub fn command(&self) -> &'static str {
        match self {
            Self::Homebrew => "brew",
            Self::Chocolatey => "choco",
        }
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Homebrew => write!(f, "Homebrew"),
            Self::Chocolatey => write!(f, "Chocolatey"),
        }
    }
}

/// Comprehensive platform information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub os: Platform,
    pub arch: Arch,
    /// Available package managers
    pub package_managers: Vec<PackageManager>,
}

/// Detect the current platform
pub fn detect_platform() -> PlatformInfo {
    let os = detect_os();
    PlatformInfo {
        os,
        arch: detect_arch(),
        package_managers: detect_package_managers(os),
    }
}

fn detect_os() -> Platform {
    match std::env::consts::OS {
        "macos" => Platform::MacOS,
        "windows" => Platform::Windows,
        "linux" => Platform::Linux,
        _ => Platform::Unknown,
    }
}

fn detect_arch() -> Arch {
    match std::env::consts::ARCH {
        "x86_64" => Arch::X86_64,
        "aarch64" => Arch::Aarch64,
        _ => Arch::Unknown,
    }
}

fn detect_package_managers(os: Platform) -> Vec<PackageManager> {
    let candidates: &[PackageManager] = match os {
        Platform::MacOS => &[PackageManager::Homebrew],
        Platform::Windows => &[PackageManager::Chocolatey],
        Platform::Linux | Platform::Unknown => &[],
    };
    candidates
        .iter()
        .copied()
        .filter(|pm| which::which(pm.command()).is_ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_display() {
        assert_eq!(Platform::MacOS.to_string(), "macOS");
        assert_eq!(Platform::Linux.to_string(), "Linux");
        assert_eq!(Platform::Windows.to_string(), "Windows");
    }

    #[test]
    fn test_package_manager_commands() {
        assert_eq!(PackageManager::Homebrew.command(), "brew");
        assert_eq!(PackageManager::Chocolatey.command(), "choco");
        assert_eq!(PackageManager::Chocolatey.to_string(), "Chocolatey");
    }

    #[test]
    fn test_linux_has_no_package_managers() {
        assert!(detect_package_managers(Platform::Linux).is_empty());
    }

    #[test]
    fn test_detect_platform() {
        let platform = detect_platform();
        assert!(matches!(
            platform.os,
            Platform::MacOS | Platform::Linux | Platform::Windows | Platform::Unknown
        ));
    }
}
