use covdelta_core::{CovdeltaConfig, Result};

use crate::models::IssueComment;

/// Pull request operations needed to keep one report comment up to date.
#[allow(async_fn_in_trait)]
pub trait PullRequestApi {
    /// Login of the account that opened pull request `number`.
    async fn pull_request_author(&self, number: u64) -> Result<String>;

    /// All conversation comments on pull request `number`, oldest first.
    async fn list_comments(&self, number: u64) -> Result<Vec<IssueComment>>;

    /// Replace the body of comment `comment_id`.
    async fn update_comment(&self, comment_id: u64, body: &str) -> Result<IssueComment>;

    /// Add a new comment to pull request `number`.
    async fn create_comment(&self, number: u64, body: &str) -> Result<IssueComment>;
}

/// What [`publish_report`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The pull request was opened by the configured bot; nothing was posted.
    SkippedBot {
        /// The author login that matched.
        login: String,
    },
    /// An earlier report comment was edited.
    Updated {
        /// Id of the edited comment.
        comment_id: u64,
    },
    /// No earlier report existed, so a new comment was added.
    Created {
        /// Id of the new comment.
        comment_id: u64,
    },
}

/// Identifies prior reports and bot-authored pull requests.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// A comment whose body starts with this line is a prior report.
    pub title_line: String,
    /// Pull requests by this login are left alone.
    pub bot_login: String,
}

impl From<&CovdeltaConfig> for PublishOptions {
    fn from(config: &CovdeltaConfig) -> Self {
        Self {
            title_line: config.report.title_line(),
            bot_login: config.github.bot_login.clone(),
        }
    }
}

/// Post `body` on pull request `number`, replacing an earlier report if any.
///
/// # Errors
///
/// Propagates the first failing API call; nothing is retried.
pub async fn publish_report<A: PullRequestApi>(
    api: &A,
    number: u64,
    body: &str,
    options: &PublishOptions,
) -> Result<PublishOutcome> {
    let author = api.pull_request_author(number).await?;
    if author == options.bot_login {
        tracing::info!(pr = number, login = %author, "pull request opened by bot, not commenting");
        return Ok(PublishOutcome::SkippedBot { login: author });
    }

    let comments = api.list_comments(number).await?;
    match find_prior_report(&comments, &options.title_line) {
        Some(existing) => {
            let updated = api.update_comment(existing.id, body).await?;
            tracing::info!(pr = number, comment = updated.id, "updated coverage comment");
            Ok(PublishOutcome::Updated {
                comment_id: updated.id,
            })
        }
        None => {
            let created = api.create_comment(number, body).await?;
            tracing::info!(pr = number, comment = created.id, "created coverage comment");
            Ok(PublishOutcome::Created {
                comment_id: created.id,
            })
        }
    }
}

/// First comment whose body starts with `title_line`.
pub fn find_prior_report<'a>(
    comments: &'a [IssueComment],
    title_line: &str,
) -> Option<&'a IssueComment> {
    comments.iter().find(|c| c.text().starts_with(title_line))
}
