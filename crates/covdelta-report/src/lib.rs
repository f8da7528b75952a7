//! Coverage parsing, averaging, diffing, and report rendering.
//!
//! Turns two `go tool cover -func` dumps into a per-file comparison and the
//! markdown comment body posted on the pull request.
//!
//! ```
//! use covdelta_report::{compare, RenderOptions};
//!
//! let main = "pkg/a.go:3:\tRun\t50.0%\ntotal:\t(statements)\t50.0%\n";
//! let current = "pkg/a.go:3:\tRun\t80.0%\ntotal:\t(statements)\t80.0%\n";
//! let diff = compare(main, current).unwrap();
//! let body = covdelta_report::render::render_report(&diff, &RenderOptions::default());
//! assert!(body.contains("increased"));
//! ```

pub mod average;
pub mod diff;
pub mod parser;
pub mod render;

pub use render::RenderOptions;

use covdelta_core::{DiffResult, Result};

/// Parse, average, and diff two coverage dumps.
///
/// # Errors
///
/// Returns [`covdelta_core::CovdeltaError::Parse`] if either dump is malformed.
pub fn compare(main: &str, current: &str) -> Result<DiffResult> {
    let main = average::average_report(&parser::parse_coverage(main)?)?;
    let current = average::average_report(&parser::parse_coverage(current)?)?;
    Ok(diff::diff_reports(&main, &current))
}

/// Round to two decimal places using the exact binary value of `value`.
///
/// Exact ties go to the even digit (`87.625` becomes `87.62`) and inexact
/// values round to the nearer neighbour (`2.675` is stored just below the tie
/// and becomes `2.67`).
pub(crate) fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Format a percentage the way coverage tooling prints floats: shortest
/// round-trip digits, always with a decimal point (`50.0`, `66.67`).
pub fn format_percentage(value: f64) -> String {
    format!("{value:?}")
}
