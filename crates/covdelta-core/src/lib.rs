//! Core types, configuration, and error handling for covdelta.
//!
//! This crate provides the shared foundation used by the other covdelta crates:
//! - [`CovdeltaError`] — unified error type using `thiserror` and `miette`
//! - [`CovdeltaConfig`] — configuration loaded from `.covdelta.toml`
//! - Shared types: [`FilePath`], [`CoverageReport`], [`AveragedCoverageReport`],
//!   [`DiffResult`], [`Trend`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{ArtifactConfig, CovdeltaConfig, GitHubConfig, ReportConfig};
pub use error::CovdeltaError;
pub use types::{
    AveragedCoverageReport, CoverageReport, DiffResult, FilePath, OutputFormat, SymbolCoverage,
    Trend, STATEMENTS_KEY, TOTAL_KEY,
};

/// A convenience `Result` type for covdelta operations.
pub type Result<T> = std::result::Result<T, CovdeltaError>;
