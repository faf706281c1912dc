//! Environment overlay for `pulumi` and `gcloud` subprocesses
//!
//! BLI never mutates its own process environment for the tools it wraps.
//! Instead every subprocess gets a [`ToolEnvironment`] layered on top of the
//! inherited environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::StackConfig;
use crate::error::{Error, Result};

pub const PULUMI_CONFIG_PASSPHRASE: &str = "PULUMI_CONFIG_PASSPHRASE";
pub const PULUMI_SKIP_UPDATE_CHECK: &str = "PULUMI_SKIP_UPDATE_CHECK";
pub const PULUMI_HOME: &str = "PULUMI_HOME";
pub const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Get the user's home directory
///
/// `HOME` is preferred over `dirs::home_dir()` so that tests and wrappers can
/// redirect it.
pub fn get_home_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return Ok(PathBuf::from(home));
        }
    }
    dirs::home_dir().ok_or(Error::HomeDirUnavailable)
}

/// Location of gcloud application default credentials under `home`
pub fn credentials_path(home: &Path) -> PathBuf {
    home.join(".config")
        .join("gcloud")
        .join("application_default_credentials.json")
}

/// Return the credentials path, failing when the file does not exist
pub fn locate_credentials(home: &Path) -> Result<PathBuf> {
    let path = credentials_path(home);
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::CredentialsNotFound { path })
    }
}

/// Variables added to a subprocess environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEnvironment {
    vars: BTreeMap<String, String>,
}

impl Default for ToolEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolEnvironment {
    /// Base overlay: empty passphrase for the local secrets provider, no update checks
    pub fn new() -> Self {
        let mut vars = BTreeMap::new();
        vars.insert(PULUMI_CONFIG_PASSPHRASE.to_string(), String::new());
        vars.insert(PULUMI_SKIP_UPDATE_CHECK.to_string(), "true".to_string());
        Self { vars }
    }

    /// Overlay for a stack command
    ///
    /// Adds `PULUMI_HOME`, the proxy variables unless `no_proxy` is set, and
    /// `GOOGLE_APPLICATION_CREDENTIALS` unless `use_local_auth` is set.
    pub fn for_stack(config: &StackConfig, pulumi_home: &Path, home: &Path) -> Result<Self> {
        let mut env = Self::new().with_pulumi_home(pulumi_home);
        if !config.no_proxy {
            env = env.with_proxy(&config.proxy.url());
        }
        if !config.use_local_auth {
            env = env.with_credentials(&locate_credentials(home)?);
        }
        Ok(env)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_pulumi_home(self, path: &Path) -> Self {
        self.with(PULUMI_HOME, path.display().to_string())
    }

    pub fn with_proxy(self, url: &str) -> Self {
        self.with("HTTP_PROXY", url).with("HTTPS_PROXY", url)
    }

    pub fn with_credentials(self, path: &Path) -> Self {
        self.with(GOOGLE_APPLICATION_CREDENTIALS, path.display().to_string())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn pulumi_home(&self) -> Option<PathBuf> {
        self.get(PULUMI_HOME).map(PathBuf::from)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProjectType, ProxySettings};
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn stack_config() -> StackConfig {
        StackConfig {
            stack_name: "dev".into(),
            project_id: "my-project".into(),
            proxy: ProxySettings {
                address: "proxy.example.com".into(),
                port: 8080,
            },
            use_local_auth: false,
            no_proxy: false,
            project_type: ProjectType::Staging,
            location: "northamerica-northeast1".into(),
            environment: "dev".into(),
        }
    }

    fn home_with_credentials() -> TempDir {
        let home = TempDir::new().unwrap();
        let path = credentials_path(home.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{}").unwrap();
        home
    }

    #[test]
    fn test_base_overlay() {
        let env = ToolEnvironment::new();
        assert_eq!(env.get(PULUMI_CONFIG_PASSPHRASE), Some(""));
        assert_eq!(env.get(PULUMI_SKIP_UPDATE_CHECK), Some("true"));
        assert!(env.get(PULUMI_HOME).is_none());
    }

    #[test]
    fn test_for_stack_sets_proxy_and_credentials() {
        let home = home_with_credentials();
        let env = ToolEnvironment::for_stack(&stack_config(), Path::new("/w/build/.pulumi"), home.path())
            .unwrap();

        assert_eq!(env.get("HTTP_PROXY"), Some("http://proxy.example.com:8080"));
        assert_eq!(env.get("HTTPS_PROXY"), Some("http://proxy.example.com:8080"));
        assert_eq!(env.pulumi_home(), Some(PathBuf::from("/w/build/.pulumi")));
        let creds = env.get(GOOGLE_APPLICATION_CREDENTIALS).unwrap();
        assert!(creds.ends_with("application_default_credentials.json"));
    }

    #[test]
    fn test_no_proxy_skips_proxy_vars() {
        let home = home_with_credentials();
        let config = StackConfig {
            no_proxy: true,
            ..stack_config()
        };
        let env = ToolEnvironment::for_stack(&config, Path::new("/p"), home.path()).unwrap();
        assert!(env.get("HTTP_PROXY").is_none());
        assert!(env.get("HTTPS_PROXY").is_none());
    }

    #[test]
    fn test_missing_credentials_is_an_error() {
        let home = TempDir::new().unwrap();
        let err = ToolEnvironment::for_stack(&stack_config(), Path::new("/p"), home.path())
            .unwrap_err();
        assert!(matches!(err, Error::CredentialsNotFound { .. }));
        assert!(err
            .to_string()
            .contains("gcloud auth application-default login"));
    }

    #[test]
    fn test_local_auth_skips_credentials() {
        let home = TempDir::new().unwrap();
        let config = StackConfig {
            use_local_auth: true,
            ..stack_config()
        };
        let env = ToolEnvironment::for_stack(&config, Path::new("/p"), home.path()).unwrap();
        assert!(env.get(GOOGLE_APPLICATION_CREDENTIALS).is_none());
    }

    #[test]
    #[serial]
    fn test_get_home_dir_prefers_env() {
        let original = std::env::var("HOME").ok();
        std::env::set_var("HOME", "/tmp/bli-home");
        let home = get_home_dir().unwrap();
        match original {
            Some(value) => std::env::set_var("HOME", value),
            None => std::env::remove_var("HOME"),
        }
        assert_eq!(home, PathBuf::from("/tmp/bli-home"));
    }
}
