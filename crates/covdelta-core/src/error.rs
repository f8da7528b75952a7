use std::path::PathBuf;

/// Errors that can occur while comparing coverage or talking to GitHub.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary renders it through `miette` at the boundary.
///
/// # Examples
///
/// ```
/// use covdelta_core::CovdeltaError;
///
/// let err = CovdeltaError::Config("missing owner".into());
/// assert!(err.to_string().contains("missing owner"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CovdeltaError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(covdelta::io))]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(covdelta::config), help("run 'covdelta init' to create a default .covdelta.toml"))]
    Config(String),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(covdelta::toml))]
    Toml(#[from] toml::de::Error),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(covdelta::serialization))]
    Serialization(#[from] serde_json::Error),

    /// A required coverage file was not found.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(code(covdelta::file_not_found))]
    FileNotFound(PathBuf),

    /// A coverage file exists but holds no data.
    #[error("no coverage data found in {}", .0.display())]
    #[diagnostic(code(covdelta::empty_input))]
    EmptyInput(PathBuf),

    /// Coverage text could not be interpreted.
    #[error("parse error on line {line}: {message}")]
    #[diagnostic(code(covdelta::parse))]
    Parse {
        /// 1-based line number, or 0 when the error is not tied to a line.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Transport-level HTTP failure (DNS, TLS, decoding).
    #[error("HTTP error: {0}")]
    #[diagnostic(code(covdelta::http))]
    Http(String),

    /// The GitHub API answered with a non-success status.
    #[error("request to {url} failed with status {status}: {body}")]
    #[diagnostic(code(covdelta::api))]
    Api {
        /// The URL that was requested.
        url: String,
        /// HTTP status code returned.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A downloaded artifact could not be unpacked.
    #[error("archive error: {0}")]
    #[diagnostic(code(covdelta::archive))]
    Archive(String),

    /// No workflow run carried the expected coverage artifact.
    #[error("no coverage artifact found: {0}")]
    #[diagnostic(code(covdelta::artifact_not_found))]
    ArtifactNotFound(String),
}

impl CovdeltaError {
    /// Build a [`CovdeltaError::Parse`] for the given 1-based line.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
