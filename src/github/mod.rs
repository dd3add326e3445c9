//! Forge API access.
//!
//! This module defines the [`ForgeClient`] interface the aggregation engine
//! talks to, the typed records it returns, and the GitHub implementation.

pub mod client;
pub mod error;
pub mod rate_limit;

pub use client::{ClientConfig, GitHubClient};
pub use error::ForgeError;
pub use rate_limit::RateLimitMonitor;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A repository returned by the organization listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub fork: bool,
}

impl RepoSummary {
    /// Build a summary for a repository addressed directly by owner and name.
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            full_name: format!("{}/{}", owner, name),
            fork: false,
        }
    }
}

/// A commit in a repository's history. Only the count matters downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
}

/// Login of a contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub login: String,
}

/// One week of a contributor's activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyBucket {
    /// Start of the week (epoch seconds).
    #[serde(default)]
    pub w: i64,
    /// Additions.
    #[serde(default)]
    pub a: u64,
    /// Deletions.
    #[serde(default)]
    pub d: u64,
    /// Commits.
    #[serde(default)]
    pub c: u64,
}

/// Per-contributor statistics for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorWeeklyStats {
    /// `None` for deleted (ghost) accounts.
    pub author: Option<Author>,
    /// Lifetime commit count in the repository.
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub weeks: Vec<WeeklyBucket>,
}

impl ContributorWeeklyStats {
    /// Sum of additions across all weeks.
    pub fn additions(&self) -> u64 {
        self.weeks.iter().map(|w| w.a).sum()
    }

    /// Sum of deletions across all weeks.
    pub fn deletions(&self) -> u64 {
        self.weeks.iter().map(|w| w.d).sum()
    }
}

/// Open/closed state shared by pull requests and issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
    #[serde(other)]
    Unknown,
}

/// A pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub state: ItemState,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PullRequestRecord {
    pub fn is_open(&self) -> bool {
        self.state == ItemState::Open
    }

    /// Closed with a merge timestamp. A closed, unmerged PR is neither open
    /// nor merged.
    pub fn is_merged(&self) -> bool {
        self.state == ItemState::Closed && self.merged_at.is_some()
    }
}

/// An issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub state: ItemState,
    #[serde(default)]
    pub title: String,
    /// Present when the "issue" is really a pull request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

impl IssueRecord {
    pub fn is_open(&self) -> bool {
        self.state == ItemState::Open
    }

    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Operations the aggregation engine needs from a forge.
///
/// Every call may suspend (network I/O, rate-limit pauses) and may fail.
pub trait ForgeClient {
    /// List repositories of an organization.
    async fn list_repos(
        &self,
        org: &str,
        include_forks: bool,
    ) -> Result<Vec<RepoSummary>, ForgeError>;

    /// List commits, optionally restricted to a time window (ISO 8601).
    async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        since: Option<&str>,
        until: Option<&str>,
    ) -> Result<Vec<CommitRecord>, ForgeError>;

    /// Bytes of code per language.
    async fn get_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<BTreeMap<String, u64>, ForgeError>;

    /// Per-contributor weekly statistics.
    async fn get_contributor_stats(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<ContributorWeeklyStats>, ForgeError>;

    /// All pull requests, open and closed.
    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<PullRequestRecord>, ForgeError>;

    /// All issues, open and closed, excluding pull requests.
    async fn list_issues(&self, owner: &str, repo: &str) -> Result<Vec<IssueRecord>, ForgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contributor_stats_decode_and_sums() {
        let json = r#"[
            {"author": {"login": "alice"}, "total": 10,
             "weeks": [{"w": 0, "a": 100, "d": 50, "c": 6}, {"w": 604800, "a": 5, "d": 1, "c": 4}]},
            {"author": null, "total": 2, "weeks": []}
        ]"#;
        let stats: Vec<ContributorWeeklyStats> = serde_json::from_str(json).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].author.as_ref().unwrap().login, "alice");
        assert_eq!(stats[0].total, 10);
        assert_eq!(stats[0].additions(), 105);
        assert_eq!(stats[0].deletions(), 51);
        assert!(stats[1].author.is_none());
    }

    #[test]
    fn test_pull_request_partition() {
        let json = r#"[
            {"state": "open", "merged_at": null, "created_at": "2024-06-01T00:00:00Z"},
            {"state": "closed", "merged_at": "2024-07-01T00:00:00Z", "created_at": "2024-06-15T00:00:00Z"},
            {"state": "closed", "created_at": "2024-06-20T00:00:00Z"}
        ]"#;
        let prs: Vec<PullRequestRecord> = serde_json::from_str(json).unwrap();
        assert!(prs[0].is_open() && !prs[0].is_merged());
        assert!(!prs[1].is_open() && prs[1].is_merged());
        assert!(!prs[2].is_open() && !prs[2].is_merged());
    }

    #[test]
    fn test_issue_state_and_pull_request_marker() {
        let json = r#"[
            {"state": "open", "title": "Bug"},
            {"state": "open", "title": "Fix", "pull_request": {"url": "x"}},
            {"state": "locked", "title": "Odd"}
        ]"#;
        let issues: Vec<IssueRecord> = serde_json::from_str(json).unwrap();
        assert!(issues[0].is_open() && !issues[0].is_pull_request());
        assert!(issues[1].is_pull_request());
        assert_eq!(issues[2].state, ItemState::Unknown);
    }

    #[test]
    fn test_repo_summary_new() {
        let repo = RepoSummary::new("acme", "anvil");
        assert_eq!(repo.full_name, "acme/anvil");
        assert!(!repo.fork);
    }
}
