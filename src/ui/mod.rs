//! User interface module - terminal output for the `depbump` binary.
//!
//! - `formatter` - Pure formatting functions
//! - This module - Printing to stdout/stderr
//!
//! Progress and errors go to stderr; stdout only carries the outcome.

pub mod formatter;

pub use formatter::{format_error, format_outcome, format_status, format_success};

use crate::cli::orchestration::WorkflowOutcome;

pub fn display_error(message: &str) {
    eprintln!("{}", format_error(message));
}

pub fn display_status(message: &str) {
    eprintln!("{}", format_status(message));
}

pub fn display_success(message: &str) {
    eprintln!("{}", format_success(message));
}

/// Print the pushed branch and pull request URL to stdout.
pub fn display_outcome(outcome: &WorkflowOutcome) {
    println!("{}", format_outcome(outcome));
}
