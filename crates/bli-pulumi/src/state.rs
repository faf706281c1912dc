//! Stack state repair
//!
//! When resources were deleted outside Pulumi, refresh and up fail on them.
//! Repair exports the state, drops the failing resources and imports the
//! result again.

use std::fs;
use std::path::Path;

use bli_core::Result;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::pulumi::Pulumi;

/// Remove resources whose URN contains any of `failing`
///
/// Resources are read from `deployment.resources` (the `stack export`
/// layout) or from a top-level `resources` array. Returns how many were removed.
pub fn prune_resources(state: &mut Value, failing: &[String]) -> usize {
    let resources = if state.pointer("/deployment/resources").is_some() {
        state.pointer_mut("/deployment/resources")
    } else {
        state.get_mut("resources")
    };
    let Some(Value::Array(resources)) = resources else {
        return 0;
    };

    let before = resources.len();
    resources.retain(|resource| {
        let urn = resource.get("urn").and_then(Value::as_str).unwrap_or("");
        !failing.iter().any(|f| urn.contains(f.as_str()))
    });
    before - resources.len()
}

/// Resources listed in exported state, empty when there are none
pub fn resources_of(state: &Value) -> Vec<Value> {
    state
        .pointer("/deployment/resources")
        .or_else(|| state.get("resources"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Export, prune and re-import the state of `stack`
///
/// The pruned state is kept at `state_file`. Returns the number of removed
/// resources; zero means nothing was imported.
pub async fn repair_state(
    pulumi: &Pulumi<'_>,
    stack: &str,
    failing: &[String],
    state_file: &Path,
) -> Result<usize> {
    let export = pulumi.stack_export(stack).await?;
    if !export.success() || export.stdout.trim().is_empty() {
        warn!("No state found to fix");
        return Ok(0);
    }

    let mut state: Value = serde_json::from_str(&export.stdout)?;
    let removed = prune_resources(&mut state, failing);
    if removed == 0 {
        debug!("No problematic resources found in state");
        return Ok(0);
    }
    info!("Removed {} problematic resources from state", removed);

    fs::write(state_file, serde_json::to_string(&state)?)?;
    let import = pulumi.stack_import(state_file, stack).await?;
    let file = state_file.to_string_lossy();
    let invocation = pulumi.invocation(&["stack", "import", "--file", &*file, "--stack", stack]);
    let message = format!("State import failed: {}", import.error_text());
    import.check(&invocation, message)?;

    info!("Successfully imported fixed state");
    Ok(removed)
}
