//! Template rendering
//!
//! Two kinds of templates are handled here:
//! - the user's own `Pulumi.yaml`, rendered with Tera against a
//!   [`RenderContext`] before Pulumi sees it
//! - embedded scaffolding written by `bli init`

mod context;

pub use context::RenderContext;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tera::{Context, Tera};
use tracing::{debug, info};

use crate::error::Result;

/// Scaffolded project file
pub const PROJECT_TEMPLATE: &str = "Pulumi.yaml";

/// Scaffolded stack configuration file
pub const STACK_TEMPLATE: &str = "Pulumi.stack.yaml";

/// Minimal project file used when a stack has to be created without one
pub const FALLBACK_PROJECT_TEMPLATE: &str = "Pulumi.fallback.yaml";

static PULUMI_REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\w+)\}").expect("valid reference regex"));

static VAR_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bVAR(?:\.(\w+)|\[\s*["'](\w+)["']\s*\])(\s*\|\s*default\b)?"#)
        .expect("valid VAR reference regex")
});

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n+").expect("valid blank line regex"));

static BLOCK_INDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]+(\{[%#])").expect("valid block indent regex"));

static BLOCK_NEWLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([%#]\})\r?\n").expect("valid block newline regex"));

/// Renders user project files and the embedded scaffolding
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a renderer with the embedded scaffolding templates registered
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(PROJECT_TEMPLATE, include_str!("project.yaml.tera"))?;
        tera.add_raw_template(STACK_TEMPLATE, include_str!("stack.yaml.tera"))?;
        tera.add_raw_template(
            FALLBACK_PROJECT_TEMPLATE,
            include_str!("fallback-project.yaml.tera"),
        )?;
        Ok(Self { tera })
    }

    /// Project file for a new stack; the project name is the stack name in snake case
    pub fn project_file(&self, stack_name: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("project_name", &project_name_for(stack_name));
        Ok(self.tera.render(PROJECT_TEMPLATE, &context)?)
    }

    /// Stack configuration file with commented GCP examples
    pub fn stack_file(&self, stack_name: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("stack_name", stack_name);
        Ok(self.tera.render(STACK_TEMPLATE, &context)?)
    }

    pub fn fallback_project_file(&self) -> Result<String> {
        Ok(self.tera.render(FALLBACK_PROJECT_TEMPLATE, &Context::new())?)
    }

    /// Render a user template string
    ///
    /// Block tags on their own line leave no blank line behind. `VAR` keys
    /// the environment does not define render as empty strings. After Tera
    /// runs, `${name}` references to known scalar context keys are replaced
    /// and runs of blank lines are collapsed to one.
    pub fn render_str(&self, source: &str, context: &RenderContext) -> Result<String> {
        let prepared = strip_block_whitespace(source);
        let mut tera_context = context.to_tera_context();
        let missing = missing_vars(&prepared, &context.vars);
        if !missing.is_empty() {
            debug!("Unset template variables render empty: {:?}", missing);
            let mut vars = context.vars.clone();
            vars.extend(missing.into_iter().map(|key| (key, String::new())));
            tera_context.insert("VAR", &vars);
        }
        let rendered = Tera::one_off(&prepared, &tera_context, false)?;
        Ok(post_process(&rendered, context))
    }

    /// Render `source` into `dest`
    pub fn render_file(&self, source: &Path, dest: &Path, context: &RenderContext) -> Result<()> {
        let template = fs::read_to_string(source)?;
        let rendered = self.render_str(&template, context)?;

        debug!("Template source ({}):\n{}", source.display(), template);
        debug!(
            "Template context: project_type={} project={} location={} environment={}",
            context.project_type, context.project, context.location, context.environment
        );
        debug!("Rendered output:\n{}", rendered);

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, rendered)?;
        info!(
            "Rendered template: {} → {}",
            file_name(source),
            file_name(dest)
        );
        Ok(())
    }
}

/// Stack name in lower snake case
pub fn project_name_for(stack_name: &str) -> String {
    stack_name.replace('-', "_").to_lowercase()
}

/// `VAR.X` / `VAR["X"]` keys referenced by `source` but absent from `vars`
///
/// References piped straight into `default` are left undefined so the
/// filter still applies.
fn missing_vars(source: &str, vars: &BTreeMap<String, String>) -> Vec<String> {
    let mut missing: Vec<String> = VAR_REFERENCE_RE
        .captures_iter(source)
        .filter(|caps| caps.get(3).is_none())
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|key| key.as_str())
        .filter(|key| !vars.contains_key(*key))
        .map(str::to_string)
        .collect();
    missing.sort();
    missing.dedup();
    missing
}

fn strip_block_whitespace(source: &str) -> String {
    let lstripped = BLOCK_INDENT_RE.replace_all(source, "$1");
    BLOCK_NEWLINE_RE.replace_all(&lstripped, "$1").into_owned()
}

fn post_process(rendered: &str, context: &RenderContext) -> String {
    let substituted = PULUMI_REFERENCE_RE.replace_all(rendered, |caps: &Captures<'_>| {
        match context.scalar(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        }
    });
    BLANK_RUN_RE.replace_all(&substituted, "\n\n").into_owned()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
