//! Pulumi lock file cleanup
//!
//! Interrupted Pulumi runs leave lock files behind in the local backend,
//! which then block every following command on the same stack.

use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use glob::Pattern;
use tracing::debug;

use crate::error::Result;
use crate::pattern;

/// Outcome of a `bli clear` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    /// These lock directories were removed
    Removed(Vec<PathBuf>),
    /// Nothing to remove at the checked location
    NotFound(PathBuf),
}

/// Root of the lock tree for a work directory
pub fn locks_root(work_dir: &Path) -> PathBuf {
    work_dir.join("build").join(".pulumi").join("locks")
}

/// Delete `*.json` lock files for `stack` under `<pulumi_home>/locks/<stack>/`
///
/// Best effort: failures are logged and skipped. Returns the number of files removed.
pub fn clear_stack_locks(pulumi_home: &Path, stack: &str) -> usize {
    let locks_dir = pulumi_home.join("locks").join(stack);
    if !locks_dir.is_dir() {
        return 0;
    }
    debug!("Clearing locks for stack '{}'", stack);

    let mut removed = 0;
    for path in pattern::matching(&locks_dir, "*.json") {
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed lock file: {}", path.display());
                removed += 1;
            }
            Err(e) => debug!("Could not remove lock file {}: {}", path.display(), e),
        }
    }
    removed
}

/// Remove lock directories for `bli clear`
///
/// With a stack, every `locks/organization/<project>/<stack>` directory is
/// removed. Without one, the whole locks directory goes.
pub fn clear_lock_dirs(work_dir: &Path, stack: Option<&str>) -> Result<ClearOutcome> {
    let root = locks_root(work_dir);

    let Some(stack) = stack else {
        if root.exists() {
            fs::remove_dir_all(&root)?;
            return Ok(ClearOutcome::Removed(vec![root]));
        }
        return Ok(ClearOutcome::NotFound(root));
    };

    let organization = root.join("organization");
    let stack_dirs = format!("*{}{}", MAIN_SEPARATOR, Pattern::escape(stack));
    let mut removed = Vec::new();
    for dir in pattern::matching(&organization, &stack_dirs)
        .into_iter()
        .filter(|p| p.is_dir())
    {
        fs::remove_dir_all(&dir)?;
        debug!("Removed lock directory {}", dir.display());
        removed.push(dir);
    }

    if removed.is_empty() {
        Ok(ClearOutcome::NotFound(organization.join("<project>").join(stack)))
    } else {
        Ok(ClearOutcome::Removed(removed))
    }
}
