//! GitHub integration: the pull request comment upsert and the base-branch
//! coverage artifact download.
//!
//! Both workflows are written against small traits ([`publish::PullRequestApi`],
//! [`artifact::ActionsApi`]) that [`client::GitHubClient`] implements, so the
//! decision logic can be exercised without a network.

pub mod artifact;
pub mod client;
pub mod models;
pub mod publish;

pub use client::GitHubClient;
