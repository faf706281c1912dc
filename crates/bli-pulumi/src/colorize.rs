//! Pulumi output coloring

use std::sync::LazyLock;

use owo_colors::OwoColorize;
use regex::Regex;

/// (pattern, replacement) pairs applied in order, each across the whole text
static RULES: LazyLock<Vec<(Regex, String)>> = LazyLock::new(|| {
    let rules: Vec<(&str, String)> = vec![
        // Resource operations
        (
            r"(\s+\+\s+)([^\s].*?)(create)",
            format!("${{1}}{}{}", "${2}".green(), "${3}".green()),
        ),
        (
            r"(\s+\-\s+)([^\s].*?)(delete)",
            format!("${{1}}{}{}", "${2}".red(), "${3}".red()),
        ),
        (
            r"(\s+~\s+)([^\s].*?)(update)",
            format!("${{1}}{}{}", "${2}".yellow(), "${3}".yellow()),
        ),
        // Section headers
        (
            r"(?m)^(Previewing update|Updating|Destroying|Refreshing) \((.*?)\):",
            format!("{} ({}):", "${1}".cyan(), "${2}".magenta()),
        ),
        (r"(?m)^(Outputs:)", "${1}".blue().to_string()),
        (r"(?m)^(Resources:)", "${1}".blue().to_string()),
        // Counts
        (r"(\d+) to create", format!("{} to create", "${1}".green())),
        (r"(\d+) to delete", format!("{} to delete", "${1}".red())),
        (r"(\d+) to update", format!("{} to update", "${1}".yellow())),
        (r"(\d+) changes", format!("{} changes", "${1}".cyan())),
        // Summary
        (
            r"(Preview|Update|Destroy|Refresh) completed",
            "${1} completed".green().to_string(),
        ),
        (r"(create:\s+)(\d+)", format!("${{1}}{}", "${2}".green())),
        (r"(delete:\s+)(\d+)", format!("${{1}}{}", "${2}".red())),
        (r"(update:\s+)(\d+)", format!("${{1}}{}", "${2}".yellow())),
        (r"(same:\s+)(\d+)", format!("${{1}}{}", "${2}".blue())),
        // Errors and warnings
        (r"(\*\*.*?failed\*\*)", "${1}".red().to_string()),
        (r"(error:.*)", "${1}".red().to_string()),
        (r"(warning:.*)", "${1}".yellow().to_string()),
        // Stack creation
        (
            r"(Stack '.*?') (not found\. Creating new stack\.\.\.)",
            format!("{} {}", "${1}".magenta(), "${2}".yellow()),
        ),
    ];

    rules
        .into_iter()
        .map(|(pattern, replacement)| {
            (
                Regex::new(pattern).expect("colorize pattern is valid"),
                replacement,
            )
        })
        .collect()
});

/// Add ANSI colors to Pulumi output
pub fn colorize_pulumi_output(output: &str) -> String {
    RULES
        .iter()
        .fold(output.to_string(), |text, (re, replacement)| {
            re.replace_all(&text, replacement.as_str()).into_owned()
        })
}
