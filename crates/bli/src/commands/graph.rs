//! Graph command - resource dependency graph of a stack

use std::collections::HashMap;

use anyhow::{Context, Result};
use bli_core::{BuildWorkspace, RenderFailure};
use bli_pulumi::operations::graph;
use bli_pulumi::{GraphFormat, GraphOptions, ProcessRunner};
use owo_colors::OwoColorize;

use crate::cli::GraphArgs;
use crate::output;

pub async fn run(args: GraphArgs) -> Result<()> {
    let format = GraphFormat::parse(&args.format).unwrap_or_default();

    let runner = ProcessRunner::new();
    let ctx = super::prepare(
        &runner,
        &args.stack,
        BuildWorkspace::new,
        RenderFailure::CopyRaw,
    )
    .await?;

    let options = GraphOptions {
        with_resources: args.tree || args.details || args.pretty,
        output: args.output.as_ref().map(|p| p.as_std_path().to_path_buf()),
    };

    let spinner = output::spinner_unless(args.stack.verbose, "Generating dependency graph...");
    let result = graph(&ctx, &options).await;
    spinner.finish_and_clear();
    let report = result?;

    if let Some(saved) = &report.saved_to {
        output::success(&format!("Graph saved to: {}", saved.display()));
        println!("{}", "To visualize the DOT graph, you can use tools like Graphviz:".cyan());
        println!("  $ dot -Tpng {} -o graph.png", saved.display());
        println!("  $ dot -Tsvg {} -o graph.svg", saved.display());
    }

    if args.tree {
        let ids = if args.details {
            report.resource_ids()
        } else {
            HashMap::new()
        };
        println!("{}", report.graph.render_tree(&ids));
    } else if args.pretty {
        println!("{}", report.graph.render_pretty());
    } else {
        match format {
            GraphFormat::Json => {
                println!("{}", report.graph.to_json().context("Failed to serialize graph")?)
            }
            GraphFormat::Yaml => {
                println!("{}", report.graph.to_yaml().context("Failed to serialize graph")?)
            }
            GraphFormat::Dot if report.saved_to.is_none() => {
                println!("\n{}", report.dot);
                output::success("Graph generated successfully");
                println!(
                    "{}",
                    "Tip: Use --tree flag for a tree view or --pretty for a formatted view".yellow()
                );
            }
            GraphFormat::Dot => {}
        }
    }
    Ok(())
}
