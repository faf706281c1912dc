//! gcloud proxy and project setup

use bli_core::{ProxySettings, Result, StackConfig, ToolEnvironment};
use tracing::info;

use crate::runner::{CommandRunner, Invocation};

pub const GCLOUD: &str = "gcloud";

/// `gcloud` with the stack's environment overlay
pub struct Gcloud<'a> {
    runner: &'a dyn CommandRunner,
    env: ToolEnvironment,
}

impl<'a> Gcloud<'a> {
    pub fn new(runner: &'a dyn CommandRunner, env: ToolEnvironment) -> Self {
        Self { runner, env }
    }

    /// `gcloud config set <key> <value>`; a non-zero exit is an error
    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        let invocation =
            Invocation::new(GCLOUD, ["config", "set", key, value]).env(self.env.clone());
        let output = self.runner.run(&invocation).await?;
        let message = format!(
            "Command '{}' failed with exit code {}: {}",
            invocation,
            output.code,
            output.error_text()
        );
        output.check(&invocation, message)?;
        Ok(())
    }

    pub async fn configure_proxy(&self, proxy: &ProxySettings) -> Result<()> {
        self.config_set("proxy/type", "http").await?;
        self.config_set("proxy/address", &proxy.address).await?;
        self.config_set("proxy/port", &proxy.port.to_string()).await
    }

    pub async fn set_project(&self, project_id: &str) -> Result<()> {
        self.config_set("project", project_id).await
    }
}

/// Proxy and authentication setup run before every stack command
///
/// Credentials were already checked when `env` was built.
pub async fn configure(
    runner: &dyn CommandRunner,
    config: &StackConfig,
    env: &ToolEnvironment,
) -> Result<()> {
    let gcloud = Gcloud::new(runner, env.clone());

    if config.no_proxy {
        info!("Skipping proxy setup");
    } else {
        info!("Setting Proxy using {}", config.proxy.url());
        gcloud.configure_proxy(&config.proxy).await?;
    }

    if config.use_local_auth {
        info!("Using local authentication");
    } else {
        info!("Setting up Google Cloud authentication");
        gcloud.set_project(&config.project_id).await?;
    }
    Ok(())
}
