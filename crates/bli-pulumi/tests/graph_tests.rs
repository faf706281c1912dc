//! Graph generation against a recording runner

mod common;

use bli_core::RenderFailure;
use bli_pulumi::operations::graph;
use bli_pulumi::GraphOptions;
use common::{context, listing, work_dir, RecordingRunner};
use std::path::PathBuf;

const DOT: &str = r#"strict digraph {
    Resource0 [label="urn:pulumi:dev::shop::pulumi:pulumi:Stack::shop-dev"];
    Resource1 [label="urn:pulumi:dev::shop::gcp:storage/bucket:Bucket::assets"];
    Resource1 -> Resource0;
}
"#;

#[tokio::test]
async fn graph_requires_login() {
    let work = work_dir();
    let runner = RecordingRunner::new();
    runner.on("pulumi login", 255, "", "error: could not log in");
    let ctx = context(&runner, work.path(), RenderFailure::CopyRaw).await;

    let err = graph(&ctx, &GraphOptions::default()).await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to login to Pulumi. Cannot generate graph.");
    assert_eq!(runner.call_count("pulumi login"), 5);
    runner.assert_not_called_with("stack graph");
}

#[tokio::test]
async fn graph_requires_listed_stack() {
    let work = work_dir();
    let runner = RecordingRunner::new();
    let ctx = context(&runner, work.path(), RenderFailure::CopyRaw).await;

    let err = graph(&ctx, &GraphOptions::default()).await.unwrap_err();

    assert_eq!(err.to_string(), "Stack 'dev' not found. Cannot generate graph.");
}

#[tokio::test]
async fn graph_reads_dot_output() {
    let work = work_dir();
    let runner = RecordingRunner::new();
    runner.on("stack ls", 0, &listing(), "");
    runner.on_writing("stack graph", 2, DOT);
    let ctx = context(&runner, work.path(), RenderFailure::CopyRaw).await;

    let report = graph(&ctx, &GraphOptions::default()).await.unwrap();

    assert_eq!(report.dot, DOT);
    assert_eq!(report.graph.nodes.len(), 2);
    assert!(report.resources.is_empty());
    assert_eq!(report.saved_to, None);
    runner.assert_not_called_with("stack export");

    let graph_call = runner
        .lines()
        .into_iter()
        .find(|l| l.contains("stack graph"))
        .unwrap();
    assert!(graph_call.ends_with(".dot --stack dev"), "{}", graph_call);
}

#[tokio::test]
async fn graph_saves_output_and_fetches_resources() {
    let work = work_dir();
    let runner = RecordingRunner::new();
    runner.on("stack ls", 0, &listing(), "");
    runner.on_writing("stack graph", 2, DOT);
    let export = serde_json::json!({
        "deployment": {
            "resources": [
                {"urn": "urn:pulumi:dev::shop::pulumi:pulumi:Stack::shop-dev"},
                {"urn": "urn:pulumi:dev::shop::gcp:storage/bucket:Bucket::assets", "id": "assets-7f3a"}
            ]
        }
    });
    runner.on("stack export", 0, &export.to_string(), "");
    let ctx = context(&runner, work.path(), RenderFailure::CopyRaw).await;

    let options = GraphOptions {
        with_resources: true,
        output: Some(PathBuf::from("graphs/dev.dot")),
    };
    let report = graph(&ctx, &options).await.unwrap();

    let saved = work.path().join("graphs/dev.dot");
    assert_eq!(report.saved_to.as_deref(), Some(saved.as_path()));
    assert_eq!(std::fs::read_to_string(saved).unwrap(), DOT);

    assert_eq!(report.resources.len(), 2);
    let ids = report.resource_ids();
    assert_eq!(
        ids.get("urn:pulumi:dev::shop::gcp:storage/bucket:Bucket::assets")
            .map(String::as_str),
        Some("assets-7f3a")
    );
    let tree = report.graph.render_tree(&ids);
    assert!(tree.contains("└── assets (gcp:storage/bucket:Bucket) - ID: "));
}
