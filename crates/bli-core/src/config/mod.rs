//! Configuration for BLI stack commands
//!
//! Values are resolved in three layers: command-line flags, then the
//! optional `bli.yaml` in the work directory, then built-in defaults.

mod settings;
mod stack;

pub use settings::{ProxySettings, WorkspaceSettings, SETTINGS_FILE_NAME};
pub use stack::{resolve_stack_name, ProjectType, StackConfig, StackOptions};

/// Proxy host used when neither flags nor bli.yaml name one
pub const DEFAULT_PROXY_ADDRESS: &str = "proxy.telus.com";

/// Proxy port used when neither flags nor bli.yaml name one
pub const DEFAULT_PROXY_PORT: u16 = 8080;

/// GCP location exposed to templates
pub const DEFAULT_LOCATION: &str = "northamerica-northeast1";

/// Environment name exposed to templates as `environment` and `env`
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// Stack name inferred when the work directory already holds a Pulumi.yaml
pub const INFERRED_STACK_NAME: &str = "bli-stack";
