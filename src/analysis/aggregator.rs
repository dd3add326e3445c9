//! Organization-wide statistics aggregation.
//!
//! The engine resolves the repositories to analyze, collects each one
//! through a [`ForgeClient`], and merges the successful results into a
//! single [`OrgReport`]. A failing repository is recorded by name and
//! never aborts the batch.

use super::contributors::{filter_contributors, sort_contributors, ContributorTotals};
use super::languages::{to_language_stats, LanguageTotals};
use crate::github::{ForgeClient, ForgeError, RepoSummary};
use crate::models::{ContributorStats, OrgReport, RepoStats, SortKey};
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Options controlling what is collected and how contributors are shaped.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Analyze only this repository (skips the organization listing).
    pub repo: Option<String>,
    /// Only count commits after this ISO 8601 date.
    pub since: Option<String>,
    /// Only count commits before this ISO 8601 date.
    pub until: Option<String>,
    /// Include forked repositories in the listing.
    pub include_forks: bool,
    /// Repository names to skip.
    pub exclude_repos: Vec<String>,
    /// Drop bot accounts from the contributor list.
    pub exclude_bots: bool,
    /// Drop contributors below this commit count (0 keeps everyone).
    pub min_commits: u64,
    /// Contributor ordering.
    pub sort_by: SortKey,
    /// Maximum repositories collected at once.
    pub concurrency: usize,
    /// Draw a progress bar on stderr.
    pub show_progress: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            repo: None,
            since: None,
            until: None,
            include_forks: false,
            exclude_repos: Vec::new(),
            exclude_bots: false,
            min_commits: 0,
            sort_by: SortKey::Commits,
            concurrency: 4,
            show_progress: false,
        }
    }
}

/// Result of collecting one repository.
#[derive(Debug)]
pub enum RepoOutcome {
    /// Every call succeeded.
    Collected(RepoStats),
    /// A call failed; nothing from this repository is kept.
    Failed { name: String, error: ForgeError },
}

/// Collect statistics for `org` and merge them into one report.
///
/// Only a failure of the organization listing itself is returned as an
/// error; per-repository failures end up in `failed_repos`.
pub async fn aggregate<C: ForgeClient>(
    client: &C,
    org: &str,
    options: &AggregateOptions,
) -> Result<OrgReport> {
    let targets = resolve_repos(client, org, options).await?;
    info!("Collecting statistics for {} repositories", targets.len());

    let progress = progress_bar(targets.len(), options.show_progress);
    let tick = &progress;

    let outcomes: Vec<RepoOutcome> = stream::iter(targets.iter())
        .map(|repo| async move {
            let outcome = collect_repo(client, org, repo, options).await;
            tick.inc(1);
            outcome
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    progress.finish_and_clear();

    Ok(build_report(org, options, outcomes))
}

/// Determine which repositories to analyze.
async fn resolve_repos<C: ForgeClient>(
    client: &C,
    org: &str,
    options: &AggregateOptions,
) -> Result<Vec<RepoSummary>> {
    if let Some(ref repo) = options.repo {
        debug!("Single repository mode: {}/{}", org, repo);
        return Ok(vec![RepoSummary::new(org, repo)]);
    }

    let repos = client
        .list_repos(org, options.include_forks)
        .await
        .with_context(|| format!("Failed to list repositories for {}", org))?;

    let excluded: HashSet<&str> = options.exclude_repos.iter().map(String::as_str).collect();
    let (kept, skipped): (Vec<_>, Vec<_>) = repos
        .into_iter()
        .partition(|r| !excluded.contains(r.name.as_str()));

    if !skipped.is_empty() {
        debug!(
            "Excluded repositories: {}",
            skipped
                .iter()
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(kept)
}

/// Collect one repository, turning any failure into [`RepoOutcome::Failed`].
async fn collect_repo<C: ForgeClient>(
    client: &C,
    owner: &str,
    repo: &RepoSummary,
    options: &AggregateOptions,
) -> RepoOutcome {
    debug!("Collecting {}", repo.full_name);

    match fetch_repo_stats(client, owner, repo, options).await {
        Ok(stats) => RepoOutcome::Collected(stats),
        Err(error) => {
            warn!("Failed to collect stats for {}: {}", repo.full_name, error);
            RepoOutcome::Failed {
                name: repo.name.clone(),
                error,
            }
        }
    }
}

async fn fetch_repo_stats<C: ForgeClient>(
    client: &C,
    owner: &str,
    repo: &RepoSummary,
    options: &AggregateOptions,
) -> Result<RepoStats, ForgeError> {
    let name = repo.name.as_str();

    let commits = client
        .list_commits(
            owner,
            name,
            options.since.as_deref(),
            options.until.as_deref(),
        )
        .await?;
    let languages = client.get_languages(owner, name).await?;
    let weekly = client.get_contributor_stats(owner, name).await?;
    let pulls = client.list_pull_requests(owner, name).await?;
    let issues = client.list_issues(owner, name).await?;

    // Deleted accounts still count toward repository line totals.
    let total_additions = weekly.iter().map(|s| s.additions()).sum();
    let total_deletions = weekly.iter().map(|s| s.deletions()).sum();

    let contributors: Vec<ContributorStats> = weekly
        .iter()
        .filter_map(|s| {
            let author = s.author.as_ref()?;
            Some(ContributorStats {
                username: author.login.clone(),
                commits: s.total,
                additions: s.additions(),
                deletions: s.deletions(),
            })
        })
        .collect();

    let stats = RepoStats {
        name: repo.name.clone(),
        full_name: repo.full_name.clone(),
        total_commits: commits.len() as u64,
        total_additions,
        total_deletions,
        open_prs: pulls.iter().filter(|pr| pr.is_open()).count() as u64,
        merged_prs: pulls.iter().filter(|pr| pr.is_merged()).count() as u64,
        open_issues: issues.iter().filter(|i| i.is_open()).count() as u64,
        languages: to_language_stats(&languages),
        contributors,
    };

    debug!(
        "{}: {} commits, {} contributors, {} open PRs",
        stats.full_name,
        stats.total_commits,
        stats.contributors.len(),
        stats.open_prs
    );

    Ok(stats)
}

/// Merge per-repository outcomes into the final report.
///
/// Outcomes are merged only once every repository has finished, in the
/// order the repositories were resolved.
pub fn build_report(
    org: &str,
    options: &AggregateOptions,
    outcomes: Vec<RepoOutcome>,
) -> OrgReport {
    let mut report = OrgReport::new(org, options.since.as_deref(), options.until.as_deref());
    let mut languages = LanguageTotals::default();
    let mut contributors = ContributorTotals::default();

    for outcome in outcomes {
        match outcome {
            RepoOutcome::Collected(stats) => {
                report.total_commits += stats.total_commits;
                report.total_additions += stats.total_additions;
                report.total_deletions += stats.total_deletions;
                report.total_open_prs += stats.open_prs;
                report.total_merged_prs += stats.merged_prs;
                report.total_open_issues += stats.open_issues;
                languages.add(&stats.languages);
                contributors.add(&stats.contributors);
                report.repos.push(stats);
            }
            RepoOutcome::Failed { name, error } => {
                debug!("{} excluded from totals: {}", name, error);
                report.failed_repos.push(name);
            }
        }
    }

    report.total_repos = report.repos.len();
    report.languages = languages.finish();

    let mut merged = filter_contributors(
        contributors.into_vec(),
        options.exclude_bots,
        options.min_commits,
    );
    sort_contributors(&mut merged, options.sort_by);
    report.contributors = merged;

    info!(
        "Aggregated {} repositories ({} failed): {} commits, {} contributors",
        report.total_repos,
        report.failed_repos.len(),
        report.total_commits,
        report.contributors.len()
    );

    report
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} repos")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
