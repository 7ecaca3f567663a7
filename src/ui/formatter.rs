//! Pure formatting functions for UI output.
//!
//! Functions here build strings only; printing happens in the parent module.

use console::style;

use crate::cli::orchestration::WorkflowOutcome;

/// Error line for stderr, prefixed with a red `ERROR:`.
pub fn format_error(message: &str) -> String {
    format!("{} {}", style("ERROR:").red().for_stderr(), message)
}

/// Success line with a green checkmark.
pub fn format_success(message: &str) -> String {
    format!("{} {}", style("✓").green().for_stderr(), message)
}

/// Progress line with a yellow arrow, for stderr.
pub fn format_status(message: &str) -> String {
    format!("{} {}", style("→").yellow().for_stderr(), message)
}

/// Result of a successful run: the pushed branch and the pull request URL.
///
/// Uncolored so it can be consumed by scripts.
pub fn format_outcome(outcome: &WorkflowOutcome) -> String {
    format!(
        "Pushed branch: {}\nPull request: {}",
        outcome.branch, outcome.pull_request.html_url
    )
}
