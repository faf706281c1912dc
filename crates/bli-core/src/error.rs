//! Error types for bli-core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using bli-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for BLI
#[derive(Error, Debug)]
pub enum Error {
    /// `--stg` and `--srv` were both given
    #[error("Cannot specify both --stg and --srv flags")]
    ConflictingProjectType,

    /// No stack name given and none could be inferred
    #[error("Stack name is required. Please provide it using the -s flag.")]
    StackNameRequired,

    /// No project id given on the command line, in the environment or in bli.yaml
    #[error("GCP project id is required. Provide it with -i/--project-id, BLI_PROJECT_ID or bli.yaml")]
    ProjectIdRequired,

    /// Application default credentials are missing
    #[error(
        "Local credentials not found at {path}. Run 'gcloud auth application-default login' first."
    )]
    CredentialsNotFound { path: PathBuf },

    /// Home directory could not be resolved
    #[error("Could not determine home directory")]
    HomeDirUnavailable,

    /// Invalid settings file
    #[error("Invalid settings file {path}: {message}")]
    InvalidSettings { path: PathBuf, message: String },

    /// External executable is not installed
    #[error("'{tool}' was not found in PATH. Run 'bli depend' to install it.")]
    ToolNotFound { tool: String },

    /// External executable exited unsuccessfully
    #[error("{message}")]
    ToolFailed {
        tool: String,
        command: String,
        code: i32,
        message: String,
    },

    /// Stack does not exist in the backend
    #[error("Stack '{stack}' not found. {hint}")]
    StackNotFound { stack: String, hint: String },

    /// Template rendering error
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid settings error
    pub fn invalid_settings(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidSettings {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a tool-not-found error
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool failure carrying the process exit code
    pub fn tool_failed(
        tool: impl Into<String>,
        command: impl Into<String>,
        code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            command: command.into(),
            code,
            message: message.into(),
        }
    }

    /// Create a stack-not-found error
    pub fn stack_not_found(stack: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::StackNotFound {
            stack: stack.into(),
            hint: hint.into(),
        }
    }

    /// Exit code to report for this error
    ///
    /// Tool failures forward the wrapped tool's exit status; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ToolFailed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}
