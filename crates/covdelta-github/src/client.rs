use covdelta_core::{CovdeltaError, GitHubConfig, Result};
use serde::de::DeserializeOwned;

use crate::artifact::ActionsApi;
use crate::models::{
    Artifact, ArtifactsResponse, CommentBody, Issue, IssueComment, RunsQuery, Workflow,
    WorkflowRun, WorkflowRunsResponse,
};
use crate::publish::PullRequestApi;

const COMMENTS_PER_PAGE: usize = 100;

/// GitHub REST client scoped to one repository.
///
/// Comment traffic goes through `reqwest` so every failure can report the URL
/// and response body; Actions metadata is read through `octocrab`.
///
/// # Examples
///
/// ```no_run
/// use covdelta_core::GitHubConfig;
/// use covdelta_github::GitHubClient;
///
/// let client = GitHubClient::new("ghp_xxxx", &GitHubConfig::default()).unwrap();
/// assert_eq!(client.repo_url(), "https://api.github.com/repos/azure/retina");
/// ```
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: String,
    api_url: String,
    owner: String,
    repo: String,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Create a client for the repository named in `config`.
    ///
    /// `GITHUB_API_URL`, when set, takes precedence over `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`CovdeltaError::Config`] if the API URL is invalid or the
    /// HTTP clients cannot be built.
    pub fn new(token: &str, config: &GitHubConfig) -> Result<Self> {
        let api_url = std::env::var("GITHUB_API_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| config.api_url.clone());
        let api_url = api_url.trim_end_matches('/').to_string();

        let octocrab = octocrab::Octocrab::builder()
            .base_uri(api_url.as_str())
            .map_err(|e| CovdeltaError::Config(format!("invalid GitHub API URL '{api_url}': {e}")))?
            .personal_token(token.to_string())
            .build()
            .map_err(|e| CovdeltaError::Config(format!("failed to create GitHub client: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("covdelta/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CovdeltaError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            octocrab,
            http,
            token: token.to_string(),
            api_url,
            owner: config.owner.clone(),
            repo: config.repo.clone(),
        })
    }

    /// Base URL of the repository endpoints.
    pub fn repo_url(&self) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.owner, self.repo)
    }

    fn repo_route(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.repo)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder, url: &str) -> Result<T> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| CovdeltaError::Http(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CovdeltaError::Api {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CovdeltaError::Http(format!("failed to decode response from {url}: {e}")))
    }

    async fn octo_get<T: DeserializeOwned, Q: serde::Serialize>(
        &self,
        route: String,
        query: Option<&Q>,
    ) -> Result<T> {
        self.octocrab
            .get(&route, query)
            .await
            .map_err(|e| octocrab_error(&format!("{}{route}", self.api_url), e))
    }
}

fn octocrab_error(url: &str, err: octocrab::Error) -> CovdeltaError {
    match err {
        octocrab::Error::GitHub { source, .. } => CovdeltaError::Api {
            url: url.to_string(),
            status: source.status_code.as_u16(),
            body: source.message.clone(),
        },
        other => CovdeltaError::Http(format!("request to {url} failed: {other}")),
    }
}

impl PullRequestApi for GitHubClient {
    async fn pull_request_author(&self, number: u64) -> Result<String> {
        let url = format!("{}/issues/{number}", self.repo_url());
        let issue: Issue = self.send(self.http.get(&url), &url).await?;
        Ok(issue.user.login)
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<IssueComment>> {
        let url = format!("{}/issues/{number}/comments", self.repo_url());
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            let request = self.http.get(&url).query(&[
                ("per_page", COMMENTS_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ]);
            let batch: Vec<IssueComment> = self.send(request, &url).await?;
            let done = batch.len() < COMMENTS_PER_PAGE;
            all.extend(batch);
            if done {
                break;
            }
            page += 1;
        }
        tracing::debug!(pr = number, comments = all.len(), "fetched pull request comments");
        Ok(all)
    }

    async fn update_comment(&self, comment_id: u64, body: &str) -> Result<IssueComment> {
        let url = format!("{}/issues/comments/{comment_id}", self.repo_url());
        let request = self.http.patch(&url).json(&CommentBody { body });
        self.send(request, &url).await
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<IssueComment> {
        let url = format!("{}/issues/{number}/comments", self.repo_url());
        let request = self.http.post(&url).json(&CommentBody { body });
        self.send(request, &url).await
    }
}

impl ActionsApi for GitHubClient {
    async fn workflow_id(&self, workflow_file: &str) -> Result<u64> {
        let route = format!("{}/actions/workflows/{workflow_file}", self.repo_route());
        let workflow: Workflow = self.octo_get(route, None::<&()>).await?;
        tracing::debug!(id = workflow.id, name = %workflow.name, "resolved workflow");
        Ok(workflow.id)
    }

    async fn completed_runs(
        &self,
        workflow_id: u64,
        branch: &str,
        per_page: u32,
    ) -> Result<Vec<WorkflowRun>> {
        let route = format!("{}/actions/workflows/{workflow_id}/runs", self.repo_route());
        let query = RunsQuery {
            branch,
            status: "completed",
            per_page,
        };
        let response: WorkflowRunsResponse = self.octo_get(route, Some(&query)).await?;
        Ok(response.workflow_runs)
    }

    async fn run_artifacts(&self, run_id: u64) -> Result<Vec<Artifact>> {
        let route = format!("{}/actions/runs/{run_id}/artifacts", self.repo_route());
        let response: ArtifactsResponse = self.octo_get(route, None::<&()>).await?;
        Ok(response.artifacts)
    }

    async fn download_artifact(&self, artifact: &Artifact) -> Result<Vec<u8>> {
        let url = &artifact.archive_download_url;
        let response = self
            .http
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|e| CovdeltaError::Http(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CovdeltaError::Api {
                url: url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CovdeltaError::Http(format!("failed to read artifact from {url}: {e}")))?;
        Ok(bytes.to_vec())
    }
}
