//! Glob matching under a literal directory

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use glob::Pattern;
use tracing::warn;

/// Paths inside `dir` matching `pattern`
///
/// `dir` is taken literally, so brackets or asterisks in a user's work
/// directory do not change what matches. Wildcards in `pattern` apply;
/// callers escape any literal parts they splice into it.
pub(crate) fn matching(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let full = format!(
        "{}{}{}",
        Pattern::escape(&dir.to_string_lossy()),
        MAIN_SEPARATOR,
        pattern
    );
    match glob::glob(&full) {
        Ok(entries) => entries.flatten().collect(),
        Err(e) => {
            warn!("Invalid file pattern {}: {}", full, e);
            Vec::new()
        }
    }
}
