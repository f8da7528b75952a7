use std::collections::BTreeSet;

use covdelta_core::{AveragedCoverageReport, DiffResult, FilePath, Trend, TOTAL_KEY};

use crate::{format_percentage, round2};

/// Classify every file of two averaged snapshots.
///
/// `main` is the baseline and `current` the candidate. A file missing on one
/// side lands in `added` or `removed`; a file on both sides lands in exactly
/// one of `increased`, `decreased`, or `nochange`. Comparison is exact: no
/// tolerance is applied beyond the two-decimal rounding done by the averager.
///
/// The delta is always `current - main`, so `decreased` entries carry a
/// negative delta.
///
/// # Examples
///
/// ```
/// use covdelta_core::{AveragedCoverageReport, Trend};
/// use covdelta_report::diff::diff_reports;
///
/// let main = AveragedCoverageReport::default()
///     .with_total(70.0)
///     .with_file("a.go", 50.0);
/// let current = AveragedCoverageReport::default()
///     .with_total(75.0)
///     .with_file("a.go", 60.0)
///     .with_file("b.go", 90.0);
///
/// let diff = diff_reports(&main, &current);
/// assert_eq!(diff.total, Trend::Increased);
/// assert_eq!(diff.increased["a.go"], "`50.0%` ... `60.0%` (`10.0%`)");
/// assert_eq!(diff.added["b.go"], "`0%` ... `90.0%`");
/// ```
pub fn diff_reports(main: &AveragedCoverageReport, current: &AveragedCoverageReport) -> DiffResult {
    let mut diff = DiffResult {
        main_total: main.total,
        current_total: current.total,
        ..Default::default()
    };

    let keys: BTreeSet<&FilePath> = main.files.keys().chain(current.files.keys()).collect();
    for key in keys {
        match (main.files.get(key), current.files.get(key)) {
            (None, Some(&cur)) => {
                diff.added.insert(key.clone(), added_entry(cur));
            }
            (Some(&base), None) => {
                diff.removed.insert(key.clone(), removed_entry(base));
            }
            (Some(&base), Some(&cur)) => {
                if base < cur {
                    diff.increased.insert(key.clone(), delta_entry(base, cur));
                } else if base > cur {
                    diff.decreased.insert(key.clone(), delta_entry(base, cur));
                } else {
                    diff.nochange.insert(key.clone(), transition(base, cur));
                }
            }
            (None, None) => unreachable!("key comes from one of the two maps"),
        }
    }

    match (main.total, current.total) {
        (Some(base), Some(cur)) => diff.total = trend(base, cur),
        (None, Some(cur)) => {
            diff.added.insert(FilePath::from(TOTAL_KEY), added_entry(cur));
        }
        (Some(base), None) => {
            diff.removed.insert(FilePath::from(TOTAL_KEY), removed_entry(base));
        }
        (None, None) => {}
    }

    tracing::debug!(
        increased = diff.increased.len(),
        decreased = diff.decreased.len(),
        added = diff.added.len(),
        removed = diff.removed.len(),
        nochange = diff.nochange.len(),
        total = %diff.total,
        "diffed coverage snapshots"
    );
    diff
}

fn trend(base: f64, cur: f64) -> Trend {
    if base < cur {
        Trend::Increased
    } else if base > cur {
        Trend::Decreased
    } else {
        Trend::NoChange
    }
}

fn transition(base: f64, cur: f64) -> String {
    format!(
        "`{}%` ... `{}%`",
        format_percentage(base),
        format_percentage(cur)
    )
}

fn delta_entry(base: f64, cur: f64) -> String {
    format!(
        "{} (`{}%`)",
        transition(base, cur),
        format_percentage(round2(cur - base))
    )
}

fn added_entry(cur: f64) -> String {
    format!("`0%` ... `{}%`", format_percentage(cur))
}

fn removed_entry(base: f64) -> String {
    format!("`{}%` ... `0%`", format_percentage(base))
}
