//! Pulumi and GCP error interpretation
//!
//! Pulumi output for a failed cloud call runs to dozens of lines. These
//! helpers reduce it to a sentence, and pick out the resources involved so
//! deploy can attempt a repair.

use std::sync::LazyLock;

use regex::Regex;

/// Friendly messages for common `pulumi` CLI errors, checked in order
static PULUMI_ERRORS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (
            r"error: could not unmarshal.*Configuration key '(.+)' is not namespaced",
            "Invalid configuration in Pulumi.yaml. Configuration keys must be properly namespaced.",
        ),
        (
            r"error: no stack selected",
            "No Pulumi stack is selected. Run 'bli init -s <stack-name>' to create and select a stack.",
        ),
        (
            r"error: could not log in.*",
            "Failed to log in to Pulumi backend. Check your network connection and Pulumi CLI installation.",
        ),
        (
            r"error: stack '(.+)' already exists",
            "Stack already exists. Use a different stack name or run commands on the existing stack.",
        ),
        (
            r"error: failed to create stack: (.+)",
            "Stack creation failed. Make sure you have the right permissions and valid stack name.",
        ),
        (
            r"error: no project file found in",
            "No Pulumi project found in the current directory. Run 'bli init' first.",
        ),
        (
            r"error: failed to load project: (.+)",
            "Failed to load Pulumi project. Check your Pulumi.yaml file for errors.",
        ),
    ]
    .into_iter()
    .map(|(pattern, message)| {
        (
            Regex::new(pattern).expect("pulumi error pattern is valid"),
            message,
        )
    })
    .collect()
});

static URN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"urn:pulumi:[^:]+::[^:]+::(?:[^:]+:)+[^:]+::([^:\s,]+)").expect("urn regex is valid")
});

static DELETING_FAILED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z0-9_-]+)\s+\*\*deleting failed\*\*").expect("deleting failed regex is valid")
});

static RESOURCES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(Resources:.*?)(?:Duration|\z)").expect("resources regex is valid")
});

/// Map a `pulumi` error message to a BLI-specific explanation
pub fn interpret_pulumi_error(error_text: &str) -> String {
    PULUMI_ERRORS
        .iter()
        .find(|(re, _)| re.is_match(error_text))
        .map(|(_, message)| message.to_string())
        .unwrap_or_else(|| format!("Pulumi error: {}", error_text))
}

/// What [`simplify_resource_error`] recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosisKind {
    /// GCP 409: the resource exists and belongs to the caller
    AlreadyOwned,
    /// GCP 404
    NotFound,
    /// GCP 403
    PermissionDenied,
    QuotaExceeded,
    /// Command help text removed, error lines kept
    HelpStripped,
    /// `googleapi: Error <code>: <message>` extracted
    GcpError,
    /// Nothing recognized; the message is the original output
    Unrecognized,
}

/// A simplified cloud provider error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    pub kind: DiagnosisKind,
    pub message: String,
}

impl Diagnosis {
    fn new(kind: DiagnosisKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Informational rather than a failure
    pub fn is_benign(&self) -> bool {
        matches!(self.kind, DiagnosisKind::AlreadyOwned | DiagnosisKind::NotFound)
    }

    pub fn is_simplified(&self) -> bool {
        self.kind != DiagnosisKind::Unrecognized
    }
}

/// Reduce verbose cloud provider output to a short, user-facing message
pub fn simplify_resource_error(output: &str) -> Diagnosis {
    let lower = output.to_lowercase();

    if is_conflict_owned(output) {
        return Diagnosis::new(
            DiagnosisKind::AlreadyOwned,
            "The resource already exists and you already own it. No changes required.",
        );
    }
    if output.contains("Error 404") && output.contains("not found") {
        return Diagnosis::new(
            DiagnosisKind::NotFound,
            "The resource doesn't exist in the cloud provider.",
        );
    }
    if output.contains("Error 403") && (lower.contains("permission") || lower.contains("forbidden"))
    {
        return Diagnosis::new(
            DiagnosisKind::PermissionDenied,
            "You don't have sufficient permissions to perform this operation.",
        );
    }
    if lower.contains("quota") && lower.contains("exceed") {
        return Diagnosis::new(
            DiagnosisKind::QuotaExceeded,
            "Quota exceeded for this resource. Please check your GCP quotas.",
        );
    }
    if output.contains("Usage:") && output.contains("Flags:") {
        return Diagnosis::new(DiagnosisKind::HelpStripped, strip_help(output));
    }
    if output.contains("error:") {
        if let Some(message) = output.lines().find_map(googleapi_error) {
            return Diagnosis::new(DiagnosisKind::GcpError, message);
        }
    }
    Diagnosis::new(DiagnosisKind::Unrecognized, output)
}

/// Drop command help, keeping the error lines around it
fn strip_help(output: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut in_help = false;
    for line in output.split('\n') {
        if line.contains("Usage:") {
            in_help = true;
            if let Some(i) = kept
                .iter()
                .rposition(|l| l.to_lowercase().contains("error:"))
            {
                kept.truncate(i + 1);
            }
            continue;
        }
        if !in_help || line.to_lowercase().contains("error:") {
            kept.push(line);
        }
    }
    kept.join("\n")
}

/// `... googleapi: Error 403: The caller does not have permission, forbidden`
/// becomes `GCP Error 403: The caller does not have permission`.
/// Only the first colon separates the code; the message runs to the first comma.
fn googleapi_error(line: &str) -> Option<String> {
    let rest = line.split("googleapi: Error ").nth(1)?;
    let message = match rest.split_once(':') {
        Some((code, message)) => {
            let message = message.split(',').next().unwrap_or_default().trim();
            format!("GCP Error {}: {}", code, message)
        }
        None => format!("GCP Error {}: {}", rest, rest),
    };
    Some(message)
}

/// GCP 409 for a resource the caller already owns
pub fn is_conflict_owned(output: &str) -> bool {
    output.contains("Error 409") && output.contains("already own it")
}

/// Output reports a resource that no longer exists in the cloud
pub fn mentions_missing(output: &str) -> bool {
    let lower = output.to_lowercase();
    lower.contains("not found") || lower.contains("does not exist")
}

/// Resources that failed because they no longer exist
///
/// Returns full URNs taken from not-found, does-not-exist and deleting-failed
/// lines. Without any URN, falls back to names from `<name> **deleting failed**`.
pub fn extract_failing_resources(output: &str) -> Vec<String> {
    let mut failing: Vec<String> = Vec::new();

    for line in output.lines() {
        let lower = line.to_lowercase();
        let relevant = lower.contains("not found")
            || lower.contains("does not exist")
            || lower.contains("notfound")
            || lower.contains("deleting failed");
        if !relevant || !URN_RE.is_match(line) {
            continue;
        }
        let Some(start) = line.find("urn:pulumi") else {
            continue;
        };
        let urn = line[start..]
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .trim_end_matches([':', ',']);
        if !failing.iter().any(|f| f == urn) {
            failing.push(urn.to_string());
        }
    }

    if failing.is_empty() {
        for caps in DELETING_FAILED_RE.captures_iter(output) {
            let name = caps[1].to_string();
            if !failing.contains(&name) {
                failing.push(name);
            }
        }
    }
    failing
}

/// The `Resources:` block of `pulumi up` output, up to `Duration`
pub fn resources_summary(output: &str) -> Option<String> {
    RESOURCES_RE
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}
