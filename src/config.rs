//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.vibe-stats.toml` files.

use crate::cli::OutputFormat;
use crate::models::SortKey;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".vibe-stats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Repository and contributor filters.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Number of repositories collected at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}

/// GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API base URL (GitHub Enterprise: `https://host/api/v3`).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Page size for list endpoints.
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Pause when this many calls or fewer remain.
    #[serde(default = "default_rate_limit_threshold")]
    pub rate_limit_threshold: u64,

    /// Polls of the contributor-stats endpoint while GitHub computes them.
    #[serde(default = "default_stats_retries")]
    pub stats_retries: u32,

    /// Seconds between those polls.
    #[serde(default = "default_stats_retry_delay")]
    pub stats_retry_delay_seconds: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            per_page: default_per_page(),
            timeout_seconds: default_timeout(),
            rate_limit_threshold: default_rate_limit_threshold(),
            stats_retries: default_stats_retries(),
            stats_retry_delay_seconds: default_stats_retry_delay(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_timeout() -> u64 {
    30
}

fn default_rate_limit_threshold() -> u64 {
    crate::github::rate_limit::DEFAULT_THRESHOLD
}

fn default_stats_retries() -> u32 {
    3
}

fn default_stats_retry_delay() -> u64 {
    2
}

/// Repository and contributor filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Include forked repositories.
    #[serde(default)]
    pub include_forks: bool,

    /// Repository names to skip.
    #[serde(default)]
    pub exclude_repos: Vec<String>,

    /// Drop bot accounts from the contributor list.
    #[serde(default)]
    pub exclude_bots: bool,

    /// Drop contributors with fewer commits (0 disables).
    #[serde(default)]
    pub min_commits: u64,
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Contributor ordering.
    #[serde(default)]
    pub sort_by: SortKey,

    /// Contributors shown in the table.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            sort_by: SortKey::default(),
            top_n: default_top_n(),
        }
    }
}

fn default_top_n() -> usize {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.vibe-stats.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(ref api_url) = args.api_url {
            self.github.api_url = api_url.clone();
        }

        // Flags only switch features on
        if args.include_forks {
            self.filter.include_forks = true;
        }
        if args.exclude_bots {
            self.filter.exclude_bots = true;
        }
        for repo in &args.exclude_repo {
            if !self.filter.exclude_repos.contains(repo) {
                self.filter.exclude_repos.push(repo.clone());
            }
        }
        if let Some(min_commits) = args.min_commits {
            self.filter.min_commits = min_commits;
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(sort_by) = args.sort_by {
            self.report.sort_by = sort_by;
        }
        if let Some(top_n) = args.top_n {
            self.report.top_n = top_n;
        }
    }

    /// Check values that may have come from the file rather than the CLI.
    ///
    /// Call after [`Config::merge_with_args`]; applies the same limits
    /// `Args::validate` applies to the matching flags.
    pub fn validate(&self) -> Result<(), String> {
        if self.general.concurrency == 0 {
            return Err("concurrency must be at least 1".to_string());
        }

        if self.report.top_n == 0 {
            return Err("top_n must be at least 1".to_string());
        }

        let url = &self.github.api_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!(
                "api_url must start with 'http://' or 'https://', got '{}'",
                url
            ));
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
