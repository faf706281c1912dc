//! Workspace settings file (bli.yaml)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DEFAULT_ENVIRONMENT, DEFAULT_LOCATION, DEFAULT_PROXY_ADDRESS, DEFAULT_PROXY_PORT};
use crate::error::{Error, Result};

/// Settings file name, looked up in the work directory
pub const SETTINGS_FILE_NAME: &str = "bli.yaml";

/// Persisted per-workspace defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    pub location: String,

    pub environment: String,

    pub proxy: ProxySettings,
}

/// Outbound HTTP proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub address: String,
    pub port: u16,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_PROXY_ADDRESS.to_string(),
            port: DEFAULT_PROXY_PORT,
        }
    }
}

impl ProxySettings {
    /// `http://<address>:<port>`
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.address, self.port)
    }
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            stack_name: None,
            project_id: None,
            location: DEFAULT_LOCATION.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            proxy: ProxySettings::default(),
        }
    }
}

impl WorkspaceSettings {
    /// Path of the settings file inside `work_dir`
    pub fn path(work_dir: &Path) -> PathBuf {
        work_dir.join(SETTINGS_FILE_NAME)
    }

    /// Load settings from `work_dir`, falling back to defaults when the file is absent
    pub fn load(work_dir: &Path) -> Result<Self> {
        let path = Self::path(work_dir);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No {} in {}, using defaults", SETTINGS_FILE_NAME, work_dir.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let settings: Self = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_settings(&path, e.to_string()))?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings to `work_dir/bli.yaml`
    pub fn save(&self, work_dir: &Path) -> Result<PathBuf> {
        let path = Self::path(work_dir);
        let yaml = serde_yaml_ng::to_string(self)?;
        fs::write(&path, yaml)?;
        debug!("Wrote settings to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = WorkspaceSettings::load(temp.path()).unwrap();
        assert_eq!(settings, WorkspaceSettings::default());
        assert_eq!(settings.proxy.address, "proxy.telus.com");
        assert_eq!(settings.proxy.port, 8080);
        assert_eq!(settings.location, "northamerica-northeast1");
        assert_eq!(settings.environment, "dev");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("bli.yaml"),
            "stack_name: analytics\nproxy:\n  port: 3128\n",
        )
        .unwrap();

        let settings = WorkspaceSettings::load(temp.path()).unwrap();
        assert_eq!(settings.stack_name.as_deref(), Some("analytics"));
        assert_eq!(settings.proxy.port, 3128);
        assert_eq!(settings.proxy.address, "proxy.telus.com");
        assert_eq!(settings.environment, "dev");
    }

    #[test]
    fn test_malformed_file_names_path() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bli.yaml"), "proxy: [unclosed").unwrap();

        let err = WorkspaceSettings::load(temp.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidSettings { .. }));
        assert!(err.to_string().contains("bli.yaml"));
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let settings = WorkspaceSettings {
            stack_name: Some("dev-stack".into()),
            project_id: Some("my-project".into()),
            ..Default::default()
        };
        let path = settings.save(temp.path()).unwrap();
        assert!(path.ends_with("bli.yaml"));

        let loaded = WorkspaceSettings::load(temp.path()).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_proxy_url() {
        let proxy = ProxySettings {
            address: "10.0.0.1".into(),
            port: 3128,
        };
        assert_eq!(proxy.url(), "http://10.0.0.1:3128");
    }
}
