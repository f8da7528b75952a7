//! The slices of GitHub REST payloads that covdelta reads.

use serde::{Deserialize, Serialize};

/// Account that authored an issue, pull request, or comment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    /// Login name, e.g. `dependabot[bot]`.
    pub login: String,
}

/// An issue or pull request, as returned by `GET /repos/{o}/{r}/issues/{n}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    /// Author of the pull request.
    pub user: User,
}

/// A conversation comment on an issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueComment {
    /// Comment id, used to update it in place.
    pub id: u64,
    /// Markdown body; GitHub sends `null` for some deleted-content cases.
    #[serde(default)]
    pub body: Option<String>,
}

impl IssueComment {
    /// The body, or an empty string when absent.
    pub fn text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

/// Request payload for creating or editing a comment.
#[derive(Debug, Serialize)]
pub(crate) struct CommentBody<'a> {
    pub body: &'a str,
}

/// A GitHub Actions workflow definition.
#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    /// Numeric workflow id.
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Response of `GET .../actions/workflows/{id}/runs`.
#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowRunsResponse {
    pub workflow_runs: Vec<WorkflowRun>,
}

/// One execution of a workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    /// Run id.
    pub id: u64,
}

/// Response of `GET .../actions/runs/{id}/artifacts`.
#[derive(Debug, Deserialize)]
pub(crate) struct ArtifactsResponse {
    pub artifacts: Vec<Artifact>,
}

/// A file bundle uploaded by a workflow run.
#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    /// Artifact id.
    pub id: u64,
    /// Name given by `actions/upload-artifact`.
    pub name: String,
    /// URL of the zip archive.
    pub archive_download_url: String,
}

/// Query string for listing workflow runs.
#[derive(Debug, Serialize)]
pub(crate) struct RunsQuery<'a> {
    pub branch: &'a str,
    pub status: &'a str,
    pub per_page: u32,
}
