use std::collections::BTreeMap;
use std::fmt::Write;

use covdelta_core::{DiffResult, FilePath, ReportConfig, Trend};

use crate::format_percentage;

/// Knobs for [`render_report`].
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Heading text, rendered as `# {title}`.
    pub title: String,
    /// Removed from every file path in the tables.
    pub strip_prefix: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&ReportConfig::default())
    }
}

impl From<&ReportConfig> for RenderOptions {
    fn from(config: &ReportConfig) -> Self {
        Self {
            title: config.title.clone(),
            strip_prefix: config.strip_prefix.clone(),
        }
    }
}

/// Render the markdown comment body for a diff.
///
/// Only the total headline and the `increased` / `decreased` tables are
/// rendered; the other buckets are left to the JSON output.
///
/// # Examples
///
/// ```
/// use covdelta_core::{DiffResult, Trend};
/// use covdelta_report::render::{render_report, RenderOptions};
///
/// let diff = DiffResult {
///     total: Trend::Decreased,
///     main_total: Some(70.0),
///     current_total: Some(65.5),
///     ..Default::default()
/// };
/// let body = render_report(&diff, &RenderOptions::default());
/// assert!(body.starts_with("# Retina Code Coverage Report\n\n"));
/// assert!(body.contains("decreased from `70.0%` to `65.5%`  :x:"));
/// ```
pub fn render_report(diff: &DiffResult, options: &RenderOptions) -> String {
    let mut out = String::new();
    let _ = write!(out, "# {}\n\n", options.title);

    match (diff.total, diff.main_total, diff.current_total) {
        (Trend::Increased, Some(base), Some(cur)) => {
            let _ = write!(
                out,
                "## Total coverage increased from `{}%` to `{}%`  :white_check_mark:\n\n",
                format_percentage(base),
                format_percentage(cur)
            );
        }
        (Trend::Decreased, Some(base), Some(cur)) => {
            let _ = write!(
                out,
                "## Total coverage decreased from `{}%` to `{}%`  :x:\n\n",
                format_percentage(base),
                format_percentage(cur)
            );
        }
        _ => out.push_str("## Total coverage no change\n\n"),
    }

    render_table(
        &mut out,
        "Increased diff",
        &diff.increased,
        ":arrow_up:",
        &options.strip_prefix,
    );
    render_table(
        &mut out,
        "Decreased diff ",
        &diff.decreased,
        ":arrow_down:",
        &options.strip_prefix,
    );

    out
}

fn render_table(
    out: &mut String,
    heading: &str,
    rows: &BTreeMap<FilePath, String>,
    marker: &str,
    strip_prefix: &str,
) {
    if rows.is_empty() {
        return;
    }
    let _ = writeln!(out, "{heading}");
    out.push_str("| Impacted Files | Coverage | |\n");
    out.push_str("| --- | --- | --- |\n");
    for (path, change) in rows {
        let _ = writeln!(
            out,
            "| {} | {change} | {marker} |",
            display_path(path, strip_prefix)
        );
    }
    out.push('\n');
}

fn display_path(path: &FilePath, strip_prefix: &str) -> String {
    if strip_prefix.is_empty() {
        path.to_string()
    } else {
        path.as_str().replace(strip_prefix, "")
    }
}
