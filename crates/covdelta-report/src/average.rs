use covdelta_core::{
    AveragedCoverageReport, CoverageReport, CovdeltaError, Result, SymbolCoverage, STATEMENTS_KEY,
};

use crate::round2;

/// Reduce each file to the mean of its symbol percentages.
///
/// Per-file means are rounded to two decimals. The total row is not averaged:
/// its `(statements)` value is already the module-wide aggregate. Files that
/// were named but never received a symbol are dropped with a warning.
///
/// # Errors
///
/// Returns [`CovdeltaError::Parse`] if a percentage is not a number or the
/// total row lacks a `(statements)` entry.
///
/// # Examples
///
/// ```
/// use covdelta_report::{average::average_report, parser::parse_coverage};
///
/// let report = parse_coverage("a.go:1:\tF\t100.0%\na.go:2:\tG\t33.34%\n").unwrap();
/// let averaged = average_report(&report).unwrap();
/// assert_eq!(averaged.files["a.go"], 66.67);
/// ```
pub fn average_report(report: &CoverageReport) -> Result<AveragedCoverageReport> {
    let mut averaged = AveragedCoverageReport::default();

    for (path, symbols) in &report.files {
        let Some(mean) = mean_of(symbols)? else {
            tracing::warn!(file = %path, "file has no covered symbols, skipping");
            continue;
        };
        averaged.files.insert(path.clone(), round2(mean));
    }

    if let Some(total) = &report.total {
        let statements = total.get(STATEMENTS_KEY).ok_or_else(|| {
            CovdeltaError::parse(0, format!("total row has no '{STATEMENTS_KEY}' entry"))
        })?;
        averaged.total = Some(parse_percentage(statements)?);
    }

    Ok(averaged)
}

fn mean_of(symbols: &SymbolCoverage) -> Result<Option<f64>> {
    if symbols.is_empty() {
        return Ok(None);
    }
    let mut sum = 0.0;
    for value in symbols.values() {
        sum += parse_percentage(value)?;
    }
    Ok(Some(sum / symbols.len() as f64))
}

fn parse_percentage(value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| CovdeltaError::parse(0, format!("invalid coverage percentage '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use covdelta_core::FilePath;

    fn add_file(report: &mut CoverageReport, path: &str, symbols: &[(&str, &str)]) {
        let entry = report.symbols_mut(&FilePath::from(path));
        for (name, pct) in symbols {
            entry.insert((*name).into(), (*pct).into());
        }
    }

    fn add_total(report: &mut CoverageReport, pct: &str) {
        report
            .symbols_mut(&FilePath::from("total"))
            .insert(STATEMENTS_KEY.into(), pct.into());
    }

    #[test]
    fn averages_and_rounds_per_file() {
        let mut r = CoverageReport::default();
        add_file(&mut r, "a.go", &[("F", "100.0"), ("G", "0.0"), ("H", "0.0")]);
        let averaged = average_report(&r).unwrap();
        assert_eq!(averaged.files["a.go"], 33.33);
        assert_eq!(averaged.total, None);
    }

    #[test]
    fn exact_half_cent_mean_rounds_to_even() {
        let mut r = CoverageReport::default();
        add_file(
            &mut r,
            "a.go",
            &[("A", "100.0"), ("B", "100.0"), ("C", "100.0"), ("D", "50.5")],
        );
        add_file(&mut r, "b.go", &[("A", "0.25"), ("B", "0.0")]);
        let averaged = average_report(&r).unwrap();
        assert_eq!(averaged.files["a.go"], 87.62);
        assert_eq!(averaged.files["b.go"], 0.12);
    }

    #[test]
    fn total_is_taken_verbatim() {
        let mut r = CoverageReport::default();
        add_file(&mut r, "a.go", &[("F", "10.0")]);
        add_total(&mut r, "61.234");
        let averaged = average_report(&r).unwrap();
        assert_eq!(averaged.total, Some(61.234));
    }

    #[test]
    fn empty_file_is_skipped_not_divided() {
        let mut r = CoverageReport::default();
        add_file(&mut r, "empty.go", &[]);
        add_file(&mut r, "a.go", &[("F", "50.0")]);
        let averaged = average_report(&r).unwrap();
        assert!(!averaged.files.contains_key("empty.go"));
        assert_eq!(averaged.files["a.go"], 50.0);
    }

    #[test]
    fn total_without_statements_is_an_error() {
        let mut r = CoverageReport::default();
        r.symbols_mut(&FilePath::from("total"))
            .insert("lines".into(), "50.0".into());
        assert!(matches!(
            average_report(&r),
            Err(CovdeltaError::Parse { .. })
        ));
    }

    #[test]
    fn non_numeric_percentage_is_an_error() {
        let mut r = CoverageReport::default();
        add_file(&mut r, "a.go", &[("F", "abc")]);
        let err = average_report(&r).unwrap_err();
        assert!(err.to_string().contains("abc"));
    }
}
