use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Path token that carries the aggregate row in coverage output.
pub const TOTAL_KEY: &str = "total";

/// Symbol label under which the aggregate row stores its percentage.
pub const STATEMENTS_KEY: &str = "(statements)";

/// A source file as named by the coverage tool (usually a Go import path).
///
/// # Examples
///
/// ```
/// use covdelta_core::FilePath;
///
/// let path = FilePath::from("github.com/acme/widget/pkg/a.go");
/// assert_eq!(path.as_str(), "github.com/acme/widget/pkg/a.go");
/// assert_eq!(path.to_string(), "github.com/acme/widget/pkg/a.go");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilePath(String);

impl FilePath {
    /// Wrap a path string.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the reserved aggregate key.
    pub fn is_total(&self) -> bool {
        self.0 == TOTAL_KEY
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for FilePath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Function name → percentage string, exactly as printed by the coverage tool.
pub type SymbolCoverage = BTreeMap<String, String>;

/// One parsed coverage snapshot.
///
/// The aggregate `total` row is kept apart from the per-file entries so a
/// file can never shadow it.
///
/// # Examples
///
/// ```
/// use covdelta_core::{CoverageReport, FilePath};
///
/// let mut report = CoverageReport::default();
/// report
///     .symbols_mut(&FilePath::from("a.go"))
///     .insert("Run".into(), "75.0".into());
/// report
///     .symbols_mut(&FilePath::from("total"))
///     .insert("(statements)".into(), "75.0".into());
/// assert_eq!(report.files.len(), 1);
/// assert!(report.total.is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Per-file symbol coverage.
    pub files: BTreeMap<FilePath, SymbolCoverage>,
    /// The aggregate row, when the dump contained one.
    pub total: Option<SymbolCoverage>,
}

impl CoverageReport {
    /// Symbol map for `path`, created empty on first use.
    ///
    /// The reserved `total` path resolves to the aggregate row.
    pub fn symbols_mut(&mut self, path: &FilePath) -> &mut SymbolCoverage {
        if path.is_total() {
            self.total.get_or_insert_with(SymbolCoverage::new)
        } else {
            self.files.entry(path.clone()).or_default()
        }
    }
}

/// A snapshot reduced to one percentage per file.
///
/// # Examples
///
/// ```
/// use covdelta_core::AveragedCoverageReport;
///
/// let report = AveragedCoverageReport::default()
///     .with_total(70.0)
///     .with_file("a.go", 50.0);
/// assert_eq!(report.files["a.go"], 50.0);
/// assert_eq!(report.total, Some(70.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AveragedCoverageReport {
    /// Mean symbol coverage per file, rounded to two decimals.
    pub files: BTreeMap<FilePath, f64>,
    /// Statement coverage of the whole module, taken verbatim.
    pub total: Option<f64>,
}

impl AveragedCoverageReport {
    /// Builder-style helper that records one file.
    pub fn with_file(mut self, path: impl Into<FilePath>, percentage: f64) -> Self {
        self.files.insert(path.into(), percentage);
        self
    }

    /// Builder-style helper that records the total.
    pub fn with_total(mut self, percentage: f64) -> Self {
        self.total = Some(percentage);
        self
    }
}

/// Direction of the overall coverage change.
///
/// # Examples
///
/// ```
/// use covdelta_core::Trend;
///
/// assert_eq!(Trend::default(), Trend::NoChange);
/// assert_eq!(Trend::NoChange.to_string(), "no change");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    /// Total coverage went up.
    #[serde(rename = "increased")]
    Increased,
    /// Total coverage went down.
    #[serde(rename = "decreased")]
    Decreased,
    /// Totals are identical, or one side has none.
    #[default]
    #[serde(rename = "no change")]
    NoChange,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Increased => write!(f, "increased"),
            Trend::Decreased => write!(f, "decreased"),
            Trend::NoChange => write!(f, "no change"),
        }
    }
}

/// Per-file classification of two snapshots.
///
/// Each bucket maps a file to a preformatted transition such as
/// `` `50.0%` ... `60.0%` (`10.0%`) ``.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    /// Files whose coverage went up.
    pub increased: BTreeMap<FilePath, String>,
    /// Files whose coverage went down.
    pub decreased: BTreeMap<FilePath, String>,
    /// Files present only in the current snapshot.
    pub added: BTreeMap<FilePath, String>,
    /// Files present only in the main snapshot.
    pub removed: BTreeMap<FilePath, String>,
    /// Files with identical coverage.
    pub nochange: BTreeMap<FilePath, String>,
    /// Overall trend of the total row.
    pub total: Trend,
    /// Total coverage on main, when present.
    pub main_total: Option<f64>,
    /// Total coverage on the current branch, when present.
    pub current_total: Option<f64>,
}

/// Output format for the `compare` command.
///
/// # Examples
///
/// ```
/// use covdelta_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The markdown comment body.
    #[default]
    Markdown,
    /// The full diff, every bucket included.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
