use std::path::Path;

use covdelta_core::{CoverageReport, CovdeltaError, FilePath, Result};

/// Parse `go tool cover -func` output into a [`CoverageReport`].
///
/// Each line is split on tabs and every token is classified by shape:
/// a token containing `:` opens a file context (the path is everything before
/// the first `:`), a token containing `%` is the percentage of the pending
/// function name, anything else becomes the pending function name. The file
/// context carries over to following lines; the pending name does not.
///
/// # Errors
///
/// Returns [`CovdeltaError::Parse`] if a percentage appears before any file
/// path has been seen.
///
/// # Examples
///
/// ```
/// use covdelta_report::parser::parse_coverage;
///
/// let text = "github.com/acme/w/a.go:10:\tNew\t\t100.0%\n\
///             github.com/acme/w/a.go:20:\tRun\t\t50.0%\n\
///             total:\t\t\t(statements)\t75.0%\n";
/// let report = parse_coverage(text).unwrap();
/// let a = &report.files["github.com/acme/w/a.go"];
/// assert_eq!(a["New"], "100.0");
/// assert_eq!(a["Run"], "50.0");
/// assert_eq!(report.total.unwrap()["(statements)"], "75.0");
/// ```
pub fn parse_coverage(input: &str) -> Result<CoverageReport> {
    let mut report = CoverageReport::default();
    let mut path: Option<FilePath> = None;

    for (idx, line) in input.lines().enumerate() {
        let mut funcname = "";

        for token in line.split('\t') {
            if token.is_empty() {
                continue;
            }

            if let Some((file, _)) = token.split_once(':') {
                let file = FilePath::from(file);
                report.symbols_mut(&file);
                path = Some(file);
                continue;
            }

            if let Some((percentage, _)) = token.split_once('%') {
                let Some(file) = path.as_ref() else {
                    return Err(CovdeltaError::parse(
                        idx + 1,
                        format!("percentage '{token}' appears before any file path"),
                    ));
                };
                report
                    .symbols_mut(file)
                    .insert(funcname.to_string(), percentage.to_string());
                continue;
            }

            funcname = token;
        }
    }

    tracing::debug!(
        files = report.files.len(),
        has_total = report.total.is_some(),
        "parsed coverage dump"
    );
    Ok(report)
}

/// Read and parse a coverage dump from disk.
///
/// # Errors
///
/// Returns [`CovdeltaError::FileNotFound`] if `path` does not exist,
/// [`CovdeltaError::EmptyInput`] if it holds only whitespace, and
/// [`CovdeltaError::Parse`] if its content is malformed.
pub fn parse_coverage_file(path: &Path) -> Result<CoverageReport> {
    if !path.exists() {
        return Err(CovdeltaError::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Err(CovdeltaError::EmptyInput(path.to_path_buf()));
    }
    tracing::info!(path = %path.display(), bytes = content.len(), "reading coverage dump");
    parse_coverage(&content)
}
