//! Values available while rendering a user's Pulumi.yaml

use std::collections::BTreeMap;

use serde::Serialize;
use tera::Context;

use crate::config::{ProjectType, StackConfig};

/// Template context for Pulumi.yaml rendering
///
/// Besides the scalar keys, `VAR` exposes the process environment so that a
/// template can write `{{ VAR.HOME }}` or `{{ VAR["USER"] }}`.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    #[serde(rename = "VAR")]
    pub vars: BTreeMap<String, String>,
    pub environment: String,
    pub project_type: ProjectType,
    pub project: String,
    pub location: String,
}

impl RenderContext {
    /// Build a context from a resolved stack configuration and the current process environment
    pub fn from_config(config: &StackConfig) -> Self {
        Self {
            vars: std::env::vars().collect(),
            environment: config.environment.clone(),
            project_type: config.project_type,
            project: config.project_id.clone(),
            location: config.location.clone(),
        }
    }

    /// Scalar context values, by name, as substituted into `${name}` references
    pub fn scalar(&self, name: &str) -> Option<&str> {
        match name {
            "environment" | "env" => Some(&self.environment),
            "project_type" => Some(self.project_type.as_str()),
            "project" => Some(&self.project),
            "location" => Some(&self.location),
            _ => None,
        }
    }

    pub fn to_tera_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("VAR", &self.vars);
        context.insert("environment", &self.environment);
        context.insert("env", &self.environment);
        context.insert("project_type", self.project_type.as_str());
        context.insert("project", &self.project);
        context.insert("location", &self.location);
        context
    }
}
