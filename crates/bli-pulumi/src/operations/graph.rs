use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use bli_core::{Error, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{pulumi_failure, StackContext};
use crate::graph::ResourceGraph;
use crate::state::resources_of;

/// What `bli graph` needs besides the stack
#[derive(Debug, Clone, Default)]
pub struct GraphOptions {
    /// Fetch exported resources (tree, details and pretty views)
    pub with_resources: bool,
    /// Copy the DOT file here, relative paths resolve against the work dir
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct GraphReport {
    pub dot: String,
    pub graph: ResourceGraph,
    /// Exported resources, empty unless requested
    pub resources: Vec<Value>,
    pub saved_to: Option<PathBuf>,
}

impl GraphReport {
    /// URN to cloud ID for every exported resource that has one
    pub fn resource_ids(&self) -> HashMap<String, String> {
        self.resources
            .iter()
            .filter_map(|r| {
                let urn = r.get("urn")?.as_str()?;
                let id = r.get("id")?.as_str()?;
                Some((urn.to_string(), id.to_string()))
            })
            .collect()
    }
}

pub async fn graph(ctx: &StackContext<'_>, options: &GraphOptions) -> Result<GraphReport> {
    let stack = ctx.stack();
    let pulumi = ctx.pulumi();

    if !ctx.login().await?.is_logged_in() {
        return Err(Error::tool_failed(
            "pulumi",
            "pulumi login",
            1,
            "Failed to login to Pulumi. Cannot generate graph.",
        ));
    }

    if pulumi.find_stack(stack).await?.is_none() {
        return Err(Error::stack_not_found(stack, "Cannot generate graph."));
    }

    let select_args = ["stack", "select", stack];
    let selected = pulumi.run(&select_args).await?;
    if !selected.success() {
        let message = format!("Failed to select stack: {}", selected.error_text());
        return Err(pulumi_failure(&select_args, selected.code, message));
    }

    let resources = if options.with_resources {
        export_resources(ctx).await
    } else {
        Vec::new()
    };

    let dot_file = tempfile::Builder::new()
        .prefix("bli-graph-")
        .suffix(".dot")
        .tempfile()?;
    info!("Generating dependency graph for stack '{}'...", stack);
    let generated = pulumi.stack_graph(dot_file.path(), stack).await?;
    if !generated.success() {
        let file = dot_file.path().to_string_lossy();
        let message = format!("Failed to generate graph: {}", generated.error_text());
        return Err(pulumi_failure(
            &["stack", "graph", &*file, "--stack", stack],
            generated.code,
            message,
        ));
    }

    let dot = fs::read_to_string(dot_file.path())?;
    let graph = ResourceGraph::parse(&dot);
    debug!(
        "Parsed {} resource(s) and {} edge(s)",
        graph.nodes.len(),
        graph.edges.len()
    );

    let saved_to = match &options.output {
        Some(path) => {
            let dest = if path.is_absolute() {
                path.clone()
            } else {
                ctx.workspace().work_dir().join(path)
            };
            if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::copy(dot_file.path(), &dest)?;
            Some(dest)
        }
        None => None,
    };

    Ok(GraphReport {
        dot,
        graph,
        resources,
        saved_to,
    })
}

/// Resources from `stack export`; failures leave the views without details
async fn export_resources(ctx: &StackContext<'_>) -> Vec<Value> {
    let output = match ctx.pulumi().stack_export(ctx.stack()).await {
        Ok(output) if output.success() => output,
        Ok(output) => {
            warn!("Failed to get stack resources: {}", output.error_text());
            return Vec::new();
        }
        Err(e) => {
            warn!("Failed to get stack resources: {}", e);
            return Vec::new();
        }
    };
    match serde_json::from_str::<Value>(&output.stdout) {
        Ok(state) => resources_of(&state),
        Err(e) => {
            warn!("Failed to parse stack export: {}", e);
            Vec::new()
        }
    }
}
