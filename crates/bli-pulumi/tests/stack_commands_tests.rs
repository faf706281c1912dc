//! Prelude, preview and deploy against a recording runner
//!
//! Run with: cargo test --package bli-pulumi --test stack_commands_tests

mod common;

use bli_core::env::credentials_path;
use bli_core::{BuildWorkspace, RenderFailure};
use bli_pulumi::operations::{deploy, preview};
use bli_pulumi::{DeployOutcome, Recovery, StackContext};
use common::{context, listing, local_config, work_dir, RecordingRunner, PROJECT_ID, STACK};
use tempfile::TempDir;

const MISSING_BUCKET: &str = "urn:pulumi:dev::shop::gcp:storage/bucket:Bucket::assets";

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn prelude_renders_project_into_build_dir() {
    let work = work_dir();
    let runner = RecordingRunner::new();
    let ctx = context(&runner, work.path(), RenderFailure::Fail).await;

    let rendered = std::fs::read_to_string(ctx.workspace().project_file()).unwrap();
    assert!(rendered.contains(&format!("project: {}", PROJECT_ID)));
    assert!(work.path().join("build/.pulumi").is_dir());
    // local auth and no proxy: gcloud is never touched
    assert!(runner.lines().is_empty());
}

#[tokio::test]
async fn prelude_configures_gcloud_proxy_and_project() {
    let work = work_dir();
    let home = TempDir::new().unwrap();
    let credentials = credentials_path(home.path());
    std::fs::create_dir_all(credentials.parent().unwrap()).unwrap();
    std::fs::write(&credentials, "{}").unwrap();

    let mut config = local_config();
    config.use_local_auth = false;
    config.no_proxy = false;

    let runner = RecordingRunner::new();
    let ctx = StackContext::prepare(
        &runner,
        config,
        BuildWorkspace::new(work.path()),
        home.path(),
        RenderFailure::Fail,
        false,
    )
    .await
    .unwrap();

    assert_eq!(
        runner.lines(),
        vec![
            "gcloud config set proxy/type http",
            "gcloud config set proxy/address proxy.example.com",
            "gcloud config set proxy/port 3128",
            "gcloud config set project acme-data-dev",
        ]
    );
    assert_eq!(
        ctx.env().get("GOOGLE_APPLICATION_CREDENTIALS"),
        Some(credentials.display().to_string().as_str())
    );
    assert_eq!(ctx.env().get("HTTP_PROXY"), Some("http://proxy.example.com:3128"));
}

#[tokio::test]
async fn prelude_requires_credentials_without_local_auth() {
    let work = work_dir();
    let home = TempDir::new().unwrap();
    let mut config = local_config();
    config.use_local_auth = false;

    let runner = RecordingRunner::new();
    let result = StackContext::prepare(
        &runner,
        config,
        BuildWorkspace::new(work.path()),
        home.path(),
        RenderFailure::Fail,
        false,
    )
    .await;

    let err = result.err().expect("missing credentials must fail");
    assert!(err.to_string().contains("gcloud auth application-default login"));
}

#[tokio::test]
async fn prelude_clears_stale_stack_locks() {
    let work = work_dir();
    let locks = work.path().join("build/.pulumi/locks").join(STACK);
    std::fs::create_dir_all(&locks).unwrap();
    std::fs::write(locks.join("a1b2.json"), "{}").unwrap();

    let runner = RecordingRunner::new();
    context(&runner, work.path(), RenderFailure::Fail).await;

    assert!(!locks.join("a1b2.json").exists());
}

// ═══════════════════════════════════════════════════════════════════════════════
// Preview
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn preview_creates_missing_stack_then_previews() {
    let work = work_dir();
    let runner = RecordingRunner::new();
    runner.on("pulumi preview", 0, "Previewing update (dev):\n    2 to create\n", "");
    let ctx = context(&runner, work.path(), RenderFailure::Fail).await;

    let output = preview(&ctx).await.unwrap();

    assert_eq!(
        runner.lines(),
        vec![
            "pulumi login file://~ --local",
            "pulumi stack ls",
            "pulumi stack init dev --non-interactive",
            "pulumi stack select dev",
            "pulumi config set gcp:project acme-data-dev",
            "pulumi config set project acme-data-dev",
            "pulumi preview --stack dev",
        ]
    );
    let output = output.expect("captured output is returned");
    assert!(output.contains("Previewing update"));
    assert!(output.contains("to create"));

    let calls = runner.calls.lock().unwrap();
    let preview_call = calls.last().unwrap();
    assert_eq!(preview_call.cwd.as_deref(), Some(ctx.workspace().build_dir()));
    assert_eq!(
        preview_call.env.pulumi_home().as_deref(),
        Some(ctx.workspace().pulumi_home())
    );
}

#[tokio::test]
async fn preview_skips_init_for_listed_stack() {
    let work = work_dir();
    let runner = RecordingRunner::new();
    runner.on("stack ls", 0, &listing(), "");
    let ctx = context(&runner, work.path(), RenderFailure::Fail).await;

    preview(&ctx).await.unwrap();

    runner.assert_not_called_with("stack init");
    runner.assert_called_with(&["stack select dev"]);
}

#[tokio::test]
async fn preview_retries_init_after_access_token_error() {
    let work = work_dir();
    let runner = RecordingRunner::new();
    runner.on(
        "stack init",
        255,
        "",
        "error: PULUMI_ACCESS_TOKEN must be set for login during non-interactive CLI sessions",
    );
    let ctx = context(&runner, work.path(), RenderFailure::Fail).await;

    preview(&ctx).await.unwrap();

    assert!(runner.lines().contains(&"pulumi login file://".to_string()));
    assert_eq!(runner.call_count("stack init dev"), 2);
}

#[tokio::test]
async fn preview_failure_propagates_exit_code() {
    let work = work_dir();
    let runner = RecordingRunner::new();
    runner.on("stack ls", 0, &listing(), "");
    runner.on(
        "pulumi preview",
        255,
        "",
        "error: googleapi: Error 403: The caller does not have permission, forbidden",
    );
    let ctx = context(&runner, work.path(), RenderFailure::Fail).await;

    let err = preview(&ctx).await.unwrap_err();

    assert_eq!(err.exit_code(), 255);
    assert_eq!(
        err.to_string(),
        "You don't have sufficient permissions to perform this operation."
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Deploy
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn deploy_reports_resources_summary() {
    let work = work_dir();
    let runner = RecordingRunner::new();
    runner.on("stack ls", 0, &listing(), "");
    runner.on(
        "pulumi up",
        0,
        "Updating (dev):\n\nResources:\n    + 1 created\n    2 unchanged\n\nDuration: 3s\n",
        "",
    );
    let ctx = context(&runner, work.path(), RenderFailure::Fail).await;

    let outcome = deploy(&ctx).await.unwrap();

    assert_eq!(
        outcome,
        DeployOutcome::Deployed {
            summary: Some("Resources:\n    + 1 created\n    2 unchanged".to_string())
        }
    );
    let refresh = runner.position("pulumi refresh --yes --stack dev --skip-preview");
    let up = runner.position("pulumi up --yes --stack dev --skip-preview");
    assert!(refresh.unwrap() < up.unwrap());
}

#[tokio::test]
async fn deploy_treats_owned_conflict_as_success() {
    let work = work_dir();
    let runner = RecordingRunner::new();
    runner.on("stack ls", 0, &listing(), "");
    runner.on(
        "pulumi refresh",
        255,
        "",
        "error: googleapi: Error 409: You already own this bucket. Please select another name., conflict\nYou already own it.",
    );
    let ctx = context(&runner, work.path(), RenderFailure::Fail).await;

    let outcome = deploy(&ctx).await.unwrap();

    assert!(matches!(outcome, DeployOutcome::AlreadyOwned { .. }));
    runner.assert_not_called_with("pulumi up");
}

#[tokio::test]
async fn deploy_repairs_state_for_missing_resources() {
    let work = work_dir();
    let runner = RecordingRunner::new();
    runner.on("stack ls", 0, &listing(), "");
    runner.on(
        "pulumi refresh",
        255,
        "",
        &format!("error: {} not found", MISSING_BUCKET),
    );
    let export = serde_json::json!({
        "version": 3,
        "deployment": {
            "resources": [
                {"urn": "urn:pulumi:dev::shop::pulumi:pulumi:Stack::shop-dev"},
                {"urn": MISSING_BUCKET, "id": "assets"}
            ]
        }
    });
    runner.on("stack export", 0, &export.to_string(), "");
    let ctx = context(&runner, work.path(), RenderFailure::Fail).await;

    deploy(&ctx).await.unwrap();

    let state_file = ctx.workspace().fixed_state_file();
    runner.assert_called_with(&[
        "pulumi stack import --file",
        &state_file.display().to_string(),
        "--stack dev",
    ]);
    let fixed = std::fs::read_to_string(state_file).unwrap();
    assert!(!fixed.contains("Bucket::assets"));
    assert!(fixed.contains("shop-dev"));
}

#[tokio::test]
async fn deploy_replaces_failing_resource() {
    let work = work_dir();
    let runner = RecordingRunner::new();
    runner.on("stack ls", 0, &listing(), "");
    runner.on_exact(
        "pulumi up --yes --stack dev --skip-preview",
        255,
        "",
        &format!(
            "  gcp:storage:Bucket (assets):\n    error: {} not found\n",
            MISSING_BUCKET
        ),
    );
    let ctx = context(&runner, work.path(), RenderFailure::Fail).await;

    let outcome = deploy(&ctx).await.unwrap();

    assert_eq!(
        outcome,
        DeployOutcome::Recovered(Recovery::Replaced(MISSING_BUCKET.to_string()))
    );
    runner.assert_called_with(&["pulumi up --yes --stack dev --replace", MISSING_BUCKET]);
    runner.assert_not_called_with("--refresh-only");
}

#[tokio::test]
async fn deploy_falls_back_to_refresh_only_update() {
    let work = work_dir();
    let runner = RecordingRunner::new();
    runner.on("stack ls", 0, &listing(), "");
    runner.on_exact(
        "pulumi up --yes --stack dev --skip-preview",
        1,
        "",
        "error: update failed",
    );
    let ctx = context(&runner, work.path(), RenderFailure::Fail).await;

    let outcome = deploy(&ctx).await.unwrap();

    assert_eq!(outcome, DeployOutcome::Recovered(Recovery::RefreshOnly));
    let refresh_only = runner.position("pulumi up --yes --stack dev --refresh-only");
    let plain = runner
        .lines()
        .iter()
        .position(|l| l == "pulumi up --yes --stack dev");
    assert!(refresh_only.unwrap() < plain.unwrap());
}

#[tokio::test]
async fn deploy_final_failure_propagates_last_exit_code() {
    let work = work_dir();
    let runner = RecordingRunner::new();
    runner.on("stack ls", 0, &listing(), "");
    runner.on_exact(
        "pulumi up --yes --stack dev --skip-preview",
        1,
        "",
        "error: update failed",
    );
    runner.on_exact("pulumi up --yes --stack dev", 7, "", "error: still failing");
    let ctx = context(&runner, work.path(), RenderFailure::Fail).await;

    let err = deploy(&ctx).await.unwrap_err();

    assert_eq!(err.exit_code(), 7);
    assert!(err.to_string().contains("Final deployment attempt failed"));
}
