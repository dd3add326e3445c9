//! Contributor merging, bot detection, filtering and ordering.

use crate::models::{ContributorStats, SortKey};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Account names of well-known automation that do not use the `[bot]` suffix.
const KNOWN_BOTS: &[&str] = &[
    "dependabot",
    "dependabot-preview",
    "renovate",
    "renovate-bot",
    "github-actions",
    "codecov",
    "codecov-io",
    "snyk-bot",
    "greenkeeper",
    "imgbot",
    "allcontributors",
    "pre-commit-ci",
];

/// Whether a username belongs to an automated account.
///
/// Matches the `[bot]` suffix or a known bot name, case-insensitively.
/// Names that merely contain "bot" are not bots.
pub fn is_bot(username: &str) -> bool {
    let name = username.trim().to_lowercase();
    name.ends_with("[bot]") || KNOWN_BOTS.contains(&name.as_str())
}

/// Value a contributor is ordered by for a sort key.
pub fn sort_value(contributor: &ContributorStats, key: SortKey) -> u64 {
    match key {
        SortKey::Commits => contributor.commits,
        SortKey::Additions => contributor.additions,
        SortKey::Deletions => contributor.deletions,
        SortKey::Lines => contributor.lines(),
    }
}

/// Sort descending by the chosen key. Ties keep their prior order.
pub fn sort_contributors(contributors: &mut [ContributorStats], key: SortKey) {
    contributors.sort_by_key(|c| Reverse(sort_value(c, key)));
}

/// Apply the bot and minimum-commit filters.
///
/// `min_commits == 0` disables the threshold.
pub fn filter_contributors(
    contributors: Vec<ContributorStats>,
    exclude_bots: bool,
    min_commits: u64,
) -> Vec<ContributorStats> {
    contributors
        .into_iter()
        .filter(|c| !(exclude_bots && is_bot(&c.username)))
        .filter(|c| min_commits == 0 || c.commits >= min_commits)
        .collect()
}

/// Running organization-wide contributor totals keyed by username.
///
/// Entries keep first-seen order.
#[derive(Debug, Default)]
pub struct ContributorTotals {
    entries: Vec<ContributorStats>,
    index: HashMap<String, usize>,
}

impl ContributorTotals {
    /// Add one repository's contributors.
    pub fn add(&mut self, contributors: &[ContributorStats]) {
        for contributor in contributors {
            match self.index.get(&contributor.username) {
                Some(&idx) => self.entries[idx].absorb(contributor),
                None => {
                    self.index
                        .insert(contributor.username.clone(), self.entries.len());
                    self.entries.push(contributor.clone());
                }
            }
        }
    }

    /// Merged entries in first-seen order.
    pub fn into_vec(self) -> Vec<ContributorStats> {
        self.entries
    }
}
