use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CovdeltaError;

/// Top-level configuration loaded from `.covdelta.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
///
/// # Examples
///
/// ```
/// use covdelta_core::CovdeltaConfig;
///
/// let config = CovdeltaConfig::default();
/// assert_eq!(config.github.bot_login, "dependabot[bot]");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CovdeltaConfig {
    /// Repository and API settings.
    #[serde(default)]
    pub github: GitHubConfig,
    /// Report rendering and input file settings.
    #[serde(default)]
    pub report: ReportConfig,
    /// Settings for downloading the base-branch coverage artifact.
    #[serde(default)]
    pub artifact: ArtifactConfig,
}

impl CovdeltaConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CovdeltaError::Io`] if the file cannot be read, or
    /// [`CovdeltaError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use covdelta_core::CovdeltaConfig;
    /// use std::path::Path;
    ///
    /// let config = CovdeltaConfig::from_file(Path::new(".covdelta.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, CovdeltaError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`CovdeltaError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use covdelta_core::CovdeltaConfig;
    ///
    /// let toml = r#"
    /// [github]
    /// owner = "octocat"
    /// "#;
    /// let config = CovdeltaConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.github.owner, "octocat");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, CovdeltaError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Repository coordinates and API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Repository owner (default: `"azure"`).
    #[serde(default = "default_owner")]
    pub owner: String,
    /// Repository name (default: `"retina"`).
    #[serde(default = "default_repo")]
    pub repo: String,
    /// REST API base URL. `GITHUB_API_URL` overrides it at runtime.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Pull requests opened by this login never get a report comment.
    #[serde(default = "default_bot_login")]
    pub bot_login: String,
}

fn default_owner() -> String {
    "azure".into()
}

fn default_repo() -> String {
    "retina".into()
}

fn default_api_url() -> String {
    "https://api.github.com".into()
}

fn default_bot_login() -> String {
    "dependabot[bot]".into()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
            api_url: default_api_url(),
            bot_login: default_bot_login(),
        }
    }
}

/// Report rendering and input file configuration.
///
/// # Examples
///
/// ```
/// use covdelta_core::ReportConfig;
///
/// let config = ReportConfig::default();
/// assert_eq!(config.title_line(), "# Retina Code Coverage Report");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report heading. Also identifies a prior report comment on the PR.
    #[serde(default = "default_title")]
    pub title: String,
    /// Module prefix removed from file paths in the rendered tables.
    #[serde(default = "default_strip_prefix")]
    pub strip_prefix: String,
    /// Coverage dump of the pull request branch.
    #[serde(default = "default_current_file")]
    pub current_file: PathBuf,
    /// Coverage dump of the main branch.
    #[serde(default = "default_main_file")]
    pub main_file: PathBuf,
}

fn default_title() -> String {
    "Retina Code Coverage Report".into()
}

fn default_strip_prefix() -> String {
    "github.com/microsoft/retina/".into()
}

fn default_current_file() -> PathBuf {
    PathBuf::from("coverageexpanded.out")
}

fn default_main_file() -> PathBuf {
    PathBuf::from("maincoverageexpanded.out")
}

impl ReportConfig {
    /// The first line of every rendered report.
    pub fn title_line(&self) -> String {
        format!("# {}", self.title)
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            strip_prefix: default_strip_prefix(),
            current_file: default_current_file(),
            main_file: default_main_file(),
        }
    }
}

/// Where to find the base-branch coverage artifact.
///
/// # Examples
///
/// ```
/// use covdelta_core::ArtifactConfig;
///
/// let config = ArtifactConfig::default();
/// assert_eq!(config.workflow, "retina-test.yaml");
/// assert_eq!(config.runs_per_page, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Workflow file that uploads the coverage artifact.
    #[serde(default = "default_workflow")]
    pub workflow: String,
    /// Branch whose completed runs are searched.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Substring an artifact name must contain to be downloaded.
    #[serde(default = "default_name_contains")]
    pub name_contains: String,
    /// Directory the artifact is extracted into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// File expected inside the artifact.
    #[serde(default = "default_file_name")]
    pub file_name: String,
    /// How many recent runs to search.
    #[serde(default = "default_runs_per_page")]
    pub runs_per_page: u32,
}

fn default_workflow() -> String {
    "retina-test.yaml".into()
}

fn default_branch() -> String {
    "main".into()
}

fn default_name_contains() -> String {
    "coverage".into()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("mainbranchcoverage")
}

fn default_file_name() -> String {
    "coverage.out".into()
}

fn default_runs_per_page() -> u32 {
    10
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            workflow: default_workflow(),
            branch: default_branch(),
            name_contains: default_name_contains(),
            output_dir: default_output_dir(),
            file_name: default_file_name(),
            runs_per_page: default_runs_per_page(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = CovdeltaConfig::default();
        assert_eq!(config.github.owner, "azure");
        assert_eq!(config.github.repo, "retina");
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.bot_login, "dependabot[bot]");
        assert_eq!(config.report.title, "Retina Code Coverage Report");
        assert_eq!(config.report.strip_prefix, "github.com/microsoft/retina/");
        assert_eq!(
            config.report.current_file,
            PathBuf::from("coverageexpanded.out")
        );
        assert_eq!(
            config.report.main_file,
            PathBuf::from("maincoverageexpanded.out")
        );
        assert_eq!(config.artifact.branch, "main");
        assert_eq!(config.artifact.name_contains, "coverage");
        assert_eq!(config.artifact.file_name, "coverage.out");
    }

    #[test]
    fn parse_partial_toml() {
        let toml = r#"
[report]
title = "Widget Coverage"
"#;
        let config = CovdeltaConfig::from_toml(toml).unwrap();
        assert_eq!(config.report.title, "Widget Coverage");
        assert_eq!(config.report.title_line(), "# Widget Coverage");
        assert_eq!(config.report.strip_prefix, "github.com/microsoft/retina/");
        assert_eq!(config.github.owner, "azure");
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[github]
owner = "octocat"
repo = "hello-world"
api_url = "https://ghe.example.com/api/v3"
bot_login = "renovate[bot]"

[report]
title = "Hello Coverage"
strip_prefix = "github.com/octocat/hello-world/"
current_file = "pr.out"
main_file = "base.out"

[artifact]
workflow = "test.yml"
branch = "trunk"
name_contains = "cov"
output_dir = "base"
file_name = "cover.out"
runs_per_page = 5
"#;
        let config = CovdeltaConfig::from_toml(toml).unwrap();
        assert_eq!(config.github.repo, "hello-world");
        assert_eq!(config.github.bot_login, "renovate[bot]");
        assert_eq!(config.report.main_file, PathBuf::from("base.out"));
        assert_eq!(config.artifact.branch, "trunk");
        assert_eq!(config.artifact.runs_per_page, 5);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = CovdeltaConfig::from_toml("").unwrap();
        assert_eq!(config.github.repo, "retina");
        assert_eq!(config.artifact.workflow, "retina-test.yaml");
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = CovdeltaConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }
}
