//! Common test helpers for bli-pulumi integration tests
//!
//! - `RecordingRunner`: a `CommandRunner` that records every invocation and
//!   answers from scripted responses instead of spawning processes
//! - Stack configuration and work directory fixtures

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bli_core::{BuildWorkspace, ProjectType, ProxySettings, RenderFailure, Result, StackConfig};
use bli_pulumi::{CommandOutput, CommandRunner, Invocation, StackContext};
use tempfile::TempDir;

// ─── Recording runner ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Matcher {
    Contains(String),
    Exact(String),
}

impl Matcher {
    fn matches(&self, line: &str) -> bool {
        match self {
            Self::Contains(pattern) => line.contains(pattern.as_str()),
            Self::Exact(expected) => line == expected,
        }
    }
}

#[derive(Debug, Clone)]
struct Response {
    matcher: Matcher,
    output: CommandOutput,
    /// Write this content to the argument at the given index (`stack graph <file>`)
    writes: Option<(usize, String)>,
}

/// Records invocations; unscripted commands succeed with empty output.
#[derive(Debug, Clone, Default)]
#[allow(dead_code)]
pub struct RecordingRunner {
    pub calls: Arc<Mutex<Vec<Invocation>>>,
    responses: Arc<Mutex<Vec<Response>>>,
}

#[allow(dead_code)]
impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, matcher: Matcher, code: i32, stdout: &str, stderr: &str) -> &Self {
        self.responses.lock().unwrap().push(Response {
            matcher,
            output: CommandOutput {
                code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
            writes: None,
        });
        self
    }

    /// Answer command lines containing `pattern`. Earlier scripts win.
    pub fn on(&self, pattern: &str, code: i32, stdout: &str, stderr: &str) -> &Self {
        self.push(Matcher::Contains(pattern.to_string()), code, stdout, stderr)
    }

    /// Answer exactly this command line
    pub fn on_exact(&self, line: &str, code: i32, stdout: &str, stderr: &str) -> &Self {
        self.push(Matcher::Exact(line.to_string()), code, stdout, stderr)
    }

    /// Successful command that writes `content` to its `index`-th argument
    pub fn on_writing(&self, pattern: &str, index: usize, content: &str) -> &Self {
        self.responses.lock().unwrap().push(Response {
            matcher: Matcher::Contains(pattern.to_string()),
            output: CommandOutput::default(),
            writes: Some((index, content.to_string())),
        });
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(Invocation::command_line)
            .collect()
    }

    /// Assert some command line contains every fragment
    pub fn assert_called_with(&self, fragments: &[&str]) {
        let lines = self.lines();
        assert!(
            lines
                .iter()
                .any(|line| fragments.iter().all(|f| line.contains(f))),
            "no command contained {:?}. Actual calls: {:#?}",
            fragments,
            lines
        );
    }

    pub fn assert_not_called_with(&self, fragment: &str) {
        let lines = self.lines();
        assert!(
            !lines.iter().any(|line| line.contains(fragment)),
            "'{}' was called but should not have been. Actual calls: {:#?}",
            fragment,
            lines
        );
    }

    pub fn call_count(&self, fragment: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(fragment)).count()
    }

    /// Position of the first call containing `fragment`
    pub fn position(&self, fragment: &str) -> Option<usize> {
        self.lines().iter().position(|l| l.contains(fragment))
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        let line = invocation.command_line();
        let response = self
            .responses
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.matcher.matches(&line))
            .cloned();

        match response {
            Some(response) => {
                if let Some((index, content)) = &response.writes {
                    std::fs::write(&invocation.args[*index], content)?;
                }
                Ok(response.output)
            }
            None => Ok(CommandOutput::default()),
        }
    }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

pub const STACK: &str = "dev";
pub const PROJECT_ID: &str = "acme-data-dev";

/// Local auth and no proxy, so no gcloud calls and no credentials lookup
pub fn local_config() -> StackConfig {
    StackConfig {
        stack_name: STACK.to_string(),
        project_id: PROJECT_ID.to_string(),
        proxy: ProxySettings {
            address: "proxy.example.com".to_string(),
            port: 3128,
        },
        use_local_auth: true,
        no_proxy: true,
        project_type: ProjectType::Staging,
        location: "northamerica-northeast1".to_string(),
        environment: "dev".to_string(),
    }
}

/// Work directory with a templated Pulumi.yaml
pub fn work_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("Pulumi.yaml"),
        "name: shop\nruntime: yaml\nresources:\n  bucket:\n    type: gcp:storage:Bucket\n    properties:\n      project: {{ project }}\n",
    )
    .unwrap();
    dir
}

#[allow(dead_code)]
pub async fn context<'a>(
    runner: &'a RecordingRunner,
    work: &Path,
    on_render_failure: RenderFailure,
) -> StackContext<'a> {
    context_with(runner, local_config(), BuildWorkspace::new(work), on_render_failure).await
}

#[allow(dead_code)]
pub async fn context_with<'a>(
    runner: &'a RecordingRunner,
    config: StackConfig,
    workspace: BuildWorkspace,
    on_render_failure: RenderFailure,
) -> StackContext<'a> {
    let home = PathBuf::from("/nonexistent-home");
    StackContext::prepare(runner, config, workspace, &home, on_render_failure, false)
        .await
        .unwrap()
}

/// Minimal `pulumi stack ls` listing that contains the test stack
#[allow(dead_code)]
pub fn listing() -> String {
    format!(
        "NAME  LAST UPDATE  RESOURCE COUNT\n{}*  1 hour ago  3\n",
        STACK
    )
}
