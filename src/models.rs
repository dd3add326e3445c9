//! Data models for the statistics report.
//!
//! This module contains the report structures produced by the aggregation
//! engine and consumed by the renderers. They carry no behavior beyond
//! construction and a few derived values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key used to order contributors in the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Commit count (default)
    #[default]
    Commits,
    /// Lines added
    Additions,
    /// Lines deleted
    Deletions,
    /// Lines added plus lines deleted
    Lines,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Commits => write!(f, "Commits"),
            SortKey::Additions => write!(f, "Additions"),
            SortKey::Deletions => write!(f, "Deletions"),
            SortKey::Lines => write!(f, "Lines"),
        }
    }
}

/// Share of a scope's code written in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageStats {
    /// Language name as reported by the forge.
    pub language: String,
    /// Bytes of code in this language.
    pub bytes: u64,
    /// Percentage of all bytes in the scope, rounded to one decimal.
    pub percentage: f64,
}

/// Activity of a single contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorStats {
    /// Forge login of the contributor.
    pub username: String,
    /// Number of commits.
    pub commits: u64,
    /// Lines added.
    pub additions: u64,
    /// Lines deleted.
    pub deletions: u64,
}

impl ContributorStats {
    /// Creates an entry with all counters at zero.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            commits: 0,
            additions: 0,
            deletions: 0,
        }
    }

    /// Total changed lines (additions + deletions).
    pub fn lines(&self) -> u64 {
        self.additions + self.deletions
    }

    /// Adds another entry's counters to this one.
    pub fn absorb(&mut self, other: &ContributorStats) {
        self.commits += other.commits;
        self.additions += other.additions;
        self.deletions += other.deletions;
    }
}

/// Statistics for one successfully processed repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoStats {
    /// Short repository name.
    pub name: String,
    /// `owner/name`.
    pub full_name: String,
    /// Commits in the requested period.
    pub total_commits: u64,
    /// Lines added across all contributors.
    pub total_additions: u64,
    /// Lines deleted across all contributors.
    pub total_deletions: u64,
    /// Pull requests currently open.
    pub open_prs: u64,
    /// Pull requests that were merged.
    pub merged_prs: u64,
    /// Issues currently open.
    pub open_issues: u64,
    /// Languages, largest first.
    pub languages: Vec<LanguageStats>,
    /// Contributors in the order the forge returned them.
    pub contributors: Vec<ContributorStats>,
}

/// The aggregated report for one organization (or a single repository).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgReport {
    /// Organization (owner) name.
    pub org: String,
    /// Start of the commit window, echoed verbatim from the input.
    pub period_start: Option<String>,
    /// End of the commit window, echoed verbatim from the input.
    pub period_end: Option<String>,
    /// Number of repositories processed successfully.
    pub total_repos: usize,
    pub total_commits: u64,
    pub total_additions: u64,
    pub total_deletions: u64,
    pub total_open_prs: u64,
    pub total_merged_prs: u64,
    pub total_open_issues: u64,
    /// Organization-wide languages, largest first.
    pub languages: Vec<LanguageStats>,
    /// Filtered and sorted organization-wide contributors.
    pub contributors: Vec<ContributorStats>,
    /// Per-repository statistics.
    pub repos: Vec<RepoStats>,
    /// Names of repositories whose collection failed.
    pub failed_repos: Vec<String>,
}

impl OrgReport {
    /// Creates an empty report for an organization.
    pub fn new(org: impl Into<String>, since: Option<&str>, until: Option<&str>) -> Self {
        Self {
            org: org.into(),
            period_start: since.map(String::from),
            period_end: until.map(String::from),
            total_repos: 0,
            total_commits: 0,
            total_additions: 0,
            total_deletions: 0,
            total_open_prs: 0,
            total_merged_prs: 0,
            total_open_issues: 0,
            languages: Vec::new(),
            contributors: Vec::new(),
            repos: Vec::new(),
            failed_repos: Vec::new(),
        }
    }

    /// Returns true when at least one repository failed.
    pub fn is_partial(&self) -> bool {
        !self.failed_repos.is_empty()
    }
}
