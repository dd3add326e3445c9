//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation, target parsing and date resolution.

use crate::models::SortKey;
use chrono::{DateTime, Days, Local, NaiveDate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// vibe-stats - activity statistics for GitHub organizations
///
/// Collects commits, line changes, languages, pull requests, issues and
/// contributors for every repository of an organization (or one
/// repository) and prints a combined report.
///
/// Examples:
///   vibe-stats rust-lang
///   vibe-stats rust-lang/cargo --since 30d
///   vibe-stats my-org --exclude-bots --min-commits 5 --sort-by lines
///   vibe-stats my-org --format json --output stats.json
///   vibe-stats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Organization (`org`) or single repository (`org/repo`) to analyze
    #[arg(value_name = "TARGET", required_unless_present = "init_config")]
    pub target: Option<String>,

    /// GitHub personal access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Only count commits after this date
    ///
    /// Accepts YYYY-MM-DD, an ISO 8601 timestamp, or a relative
    /// expression such as 7d, 2w, 3m, 1y.
    #[arg(long, value_name = "DATE")]
    pub since: Option<String>,

    /// Only count commits before this date (same formats as --since)
    #[arg(long, value_name = "DATE")]
    pub until: Option<String>,

    /// Include forked repositories
    #[arg(long)]
    pub include_forks: bool,

    /// Repository to skip (repeatable)
    #[arg(long, value_name = "NAME")]
    pub exclude_repo: Vec<String>,

    /// Drop bot accounts from the contributor list
    #[arg(long)]
    pub exclude_bots: bool,

    /// Drop contributors with fewer commits than this
    #[arg(long, value_name = "COUNT")]
    pub min_commits: Option<u64>,

    /// Contributor ordering
    #[arg(long, value_name = "KEY")]
    pub sort_by: Option<SortKey>,

    /// Number of contributors shown in table output
    #[arg(long, value_name = "COUNT")]
    pub top_n: Option<usize>,

    /// Output format (table, json, csv)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .vibe-stats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Number of repositories collected concurrently
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// GitHub API base URL (for GitHub Enterprise)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Generate a default .vibe-stats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Terminal tables (default)
    #[default]
    Table,
    /// Complete JSON dump
    Json,
    /// Contributor rows as CSV
    Csv,
}

/// What to analyze: a whole organization or one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub owner: String,
    pub repo: Option<String>,
}

impl Target {
    /// Parse `org` or `org/repo`.
    pub fn parse(value: &str) -> Result<Self, String> {
        let value = value.trim().trim_end_matches('/');
        let mut parts = value.splitn(2, '/');
        let owner = parts.next().unwrap_or("").trim();
        let repo = parts.next().map(str::trim);

        if owner.is_empty() {
            return Err(format!("Invalid target '{}': expected ORG or ORG/REPO", value));
        }

        match repo {
            Some(repo) if repo.is_empty() || repo.contains('/') => Err(format!(
                "Invalid target '{}': expected ORG or ORG/REPO",
                value
            )),
            Some(repo) => Ok(Self {
                owner: owner.to_string(),
                repo: Some(repo.to_string()),
            }),
            None => Ok(Self {
                owner: owner.to_string(),
                repo: None,
            }),
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.target.as_deref() {
            Some(target) => {
                Target::parse(target)?;
            }
            None => return Err("A target (ORG or ORG/REPO) is required".to_string()),
        }

        if self.token().is_none() {
            return Err(
                "A GitHub token is required: pass --token or set GITHUB_TOKEN".to_string(),
            );
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.top_n == Some(0) {
            return Err("Top-n must be at least 1".to_string());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        resolve_date(self.since.as_deref())?;
        resolve_date(self.until.as_deref())?;

        Ok(())
    }

    /// Returns the parsed target. Call [`Args::validate`] first.
    pub fn target(&self) -> Result<Target, String> {
        Target::parse(self.target.as_deref().unwrap_or(""))
    }

    /// Returns the token if one was given and is not blank.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Resolve a relative date expression (`7d`, `2w`, `3m`, `1y`) against
/// `today`, returning `YYYY-MM-DD`. Months count as 30 days and years as
/// 365 days.
pub fn parse_relative_date(value: &str, today: NaiveDate) -> Option<String> {
    let value = value.trim();
    let unit = value.chars().last()?;
    let amount: u64 = value[..value.len() - unit.len_utf8()].parse().ok()?;

    let days = match unit {
        'd' => amount,
        'w' => amount.checked_mul(7)?,
        'm' => amount.checked_mul(30)?,
        'y' => amount.checked_mul(365)?,
        _ => return None,
    };

    today
        .checked_sub_days(Days::new(days))
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Resolve a `--since`/`--until` value.
///
/// Relative expressions become dates relative to today; absolute dates
/// and ISO 8601 timestamps are passed through unchanged.
pub fn resolve_date(value: Option<&str>) -> Result<Option<String>, String> {
    let Some(value) = value else {
        return Ok(None);
    };

    if let Some(date) = parse_relative_date(value, Local::now().date_naive()) {
        return Ok(Some(date));
    }

    let value = value.trim();
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
    {
        return Ok(Some(value.to_string()));
    }

    Err(format!(
        "Invalid date '{}': use YYYY-MM-DD, an ISO 8601 timestamp, or Nd/Nw/Nm/Ny",
        value
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    fn make_args(extra: &[&str]) -> Args {
        let mut argv = vec!["vibe-stats", "acme", "--token", "fake-token"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_parse_relative_date_units() {
        assert_eq!(parse_relative_date("7d", today()).unwrap(), "2024-03-24");
        assert_eq!(parse_relative_date("2w", today()).unwrap(), "2024-03-17");
        assert_eq!(parse_relative_date("3m", today()).unwrap(), "2024-01-01");
        assert_eq!(parse_relative_date("1y", today()).unwrap(), "2023-04-01");
    }

    #[test]
    fn test_parse_relative_date_invalid() {
        assert_eq!(parse_relative_date("abc", today()), None);
        assert_eq!(parse_relative_date("10x", today()), None);
        assert_eq!(parse_relative_date("", today()), None);
        assert_eq!(parse_relative_date("d", today()), None);
        assert_eq!(parse_relative_date("2024-01-01", today()), None);
    }

    #[test]
    fn test_resolve_date() {
        assert_eq!(resolve_date(None).unwrap(), None);
        assert_eq!(
            resolve_date(Some("2024-01-15")).unwrap().as_deref(),
            Some("2024-01-15")
        );
        assert_eq!(
            resolve_date(Some("2024-12-31T23:59:59Z")).unwrap().as_deref(),
            Some("2024-12-31T23:59:59Z")
        );

        let expected = (Local::now().date_naive() - Days::new(30))
            .format("%Y-%m-%d")
            .to_string();
        assert_eq!(resolve_date(Some("30d")).unwrap(), Some(expected));

        assert!(resolve_date(Some("yesterday")).is_err());
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(
            Target::parse("acme").unwrap(),
            Target {
                owner: "acme".to_string(),
                repo: None
            }
        );
        assert_eq!(
            Target::parse("acme/anvil").unwrap(),
            Target {
                owner: "acme".to_string(),
                repo: Some("anvil".to_string())
            }
        );
        assert_eq!(Target::parse("acme/").unwrap().repo, None);
        assert!(Target::parse("/anvil").is_err());
        assert!(Target::parse("a/b/c").is_err());
        assert!(Target::parse("").is_err());
    }

    #[test]
    fn test_all_options_parse() {
        let args = make_args(&[
            "--sort-by",
            "additions",
            "--exclude-bots",
            "--min-commits",
            "5",
            "--since",
            "30d",
            "--until",
            "2024-12-31",
            "--exclude-repo",
            "repo1",
            "--format",
            "json",
            "--output",
            "/tmp/out.json",
        ]);
        assert!(args.validate().is_ok());
        assert_eq!(args.sort_by, Some(SortKey::Additions));
        assert_eq!(args.min_commits, Some(5));
        assert_eq!(args.exclude_repo, vec!["repo1"]);
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.output, Some(PathBuf::from("/tmp/out.json")));
    }

    #[test]
    fn test_validation_missing_token() {
        let mut args = make_args(&[]);
        args.token = Some("  ".to_string());
        assert!(args.validate().is_err());
        args.token = None;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = make_args(&["--verbose", "--quiet"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_bad_values() {
        assert!(make_args(&["--concurrency", "0"]).validate().is_err());
        assert!(make_args(&["--top-n", "0"]).validate().is_err());
        assert!(make_args(&["--api-url", "ftp://x"]).validate().is_err());
        assert!(make_args(&["--since", "last tuesday"]).validate().is_err());
    }

    #[test]
    fn test_init_config_needs_no_target() {
        let args = Args::parse_from(["vibe-stats", "--init-config"]);
        assert!(args.target.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(&[]);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
