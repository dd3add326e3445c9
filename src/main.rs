//! vibe-stats - activity statistics for GitHub organizations
//!
//! A CLI tool that collects commits, line changes, languages, pull
//! requests, issues and contributors for one repository or a whole
//! organization and renders a combined report.
//!
//! Exit codes:
//!   0 - Success (including partial success: failed repositories are listed as a warning)
//!   1 - Runtime error (missing token, listing failure, output failure, etc.)

mod analysis;
mod cli;
mod config;
mod github;
mod models;
mod report;

use analysis::AggregateOptions;
use anyhow::{Context, Result};
use cli::{Args, OutputFormat, Target};
use config::{Config, CONFIG_FILE_NAME};
use github::{ClientConfig, GitHubClient};
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration decides the log level, so load it first
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);
    if let Err(e) = config.validate() {
        eprintln!("Error: invalid configuration: {}", e);
        std::process::exit(1);
    }

    init_logging(log_level(&args, &config));

    info!("vibe-stats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run_stats(&args, &config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .vibe-stats.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize filters, sorting, output format, and API settings.");
    Ok(())
}

/// Log level from the CLI flags and the `[general]` section.
fn log_level(args: &Args, config: &Config) -> tracing::Level {
    if args.quiet {
        tracing::Level::ERROR
    } else if config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    }
}

/// Initialize logging on stderr so rendered output on stdout stays clean.
///
/// `RUST_LOG` overrides the level when set.
fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("vibe_stats={}", level.as_str().to_lowercase()))
    });

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Explicit path must load
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}

/// Build aggregation options from the merged configuration.
fn aggregate_options(
    target: &Target,
    since: Option<String>,
    until: Option<String>,
    config: &Config,
    quiet: bool,
) -> AggregateOptions {
    AggregateOptions {
        repo: target.repo.clone(),
        since,
        until,
        include_forks: config.filter.include_forks,
        exclude_repos: config.filter.exclude_repos.clone(),
        exclude_bots: config.filter.exclude_bots,
        min_commits: config.filter.min_commits,
        sort_by: config.report.sort_by,
        concurrency: config.general.concurrency,
        show_progress: !quiet,
    }
}

/// Run the complete collection workflow.
async fn run_stats(args: &Args, config: &Config) -> Result<()> {
    let start_time = Instant::now();

    let target = args.target().map_err(anyhow::Error::msg)?;
    let token = args
        .token()
        .context("A GitHub token is required: pass --token or set GITHUB_TOKEN")?;
    let since = cli::resolve_date(args.since.as_deref()).map_err(anyhow::Error::msg)?;
    let until = cli::resolve_date(args.until.as_deref()).map_err(anyhow::Error::msg)?;

    let client = GitHubClient::new(ClientConfig::from_config(&config.github, token))
        .context("Failed to create GitHub client")?;

    let options = aggregate_options(&target, since, until, config, args.quiet);

    if !args.quiet {
        match target.repo {
            Some(ref repo) => eprintln!("📥 Collecting statistics for {}/{}", target.owner, repo),
            None => eprintln!("📥 Collecting statistics for organization {}", target.owner),
        }
    }

    let report = analysis::aggregate(&client, &target.owner, &options).await?;

    let monitor = client.rate_limit();
    if let Some(remaining) = monitor.remaining().await {
        match monitor.reset_at().await {
            Some(reset_at) => debug!("Rate limit: {} calls left, resets at {}", remaining, reset_at),
            None => debug!("Rate limit: {} calls left", remaining),
        }
    }

    let format = config.report.format;
    let content = report::render(&report, format, config.report.top_n, config.report.sort_by)?;
    report::write_output(&content, args.output.as_deref())?;

    // The table already carries the warning when it goes to the terminal
    if report.is_partial() && (format != OutputFormat::Table || args.output.is_some()) {
        eprintln!(
            "⚠️  Failed to collect stats for {} repo(s): {}",
            report.failed_repos.len(),
            report.failed_repos.join(", ")
        );
    }

    let duration = start_time.elapsed().as_secs_f64();
    info!(
        "Finished {} repositories in {:.1}s",
        report.total_repos, duration
    );

    if !args.quiet {
        eprintln!(
            "✅ Done: {} repositories, {} commits in {:.1}s",
            report.total_repos, report.total_commits, duration
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_log_level_prefers_quiet() {
        let args = Args::parse_from(["vibe-stats", "acme", "--token", "t", "--quiet"]);
        let mut config = Config::default();
        config.general.verbose = true;
        assert_eq!(log_level(&args, &config), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config() {
        let args = Args::parse_from(["vibe-stats", "acme", "--token", "t"]);
        let mut config = Config::default();
        assert_eq!(log_level(&args, &config), tracing::Level::INFO);
        config.general.verbose = true;
        assert_eq!(log_level(&args, &config), tracing::Level::DEBUG);
    }

    #[test]
    fn test_aggregate_options_from_config() {
        let args = Args::parse_from([
            "vibe-stats",
            "acme/anvil",
            "--token",
            "t",
            "--sort-by",
            "lines",
            "--exclude-bots",
            "--min-commits",
            "5",
            "--exclude-repo",
            "legacy",
            "--concurrency",
            "2",
        ]);
        let mut config = Config::default();
        config.merge_with_args(&args);
        let target = args.target().unwrap();

        let options = aggregate_options(
            &target,
            Some("2024-01-01".to_string()),
            None,
            &config,
            true,
        );
        assert_eq!(options.repo.as_deref(), Some("anvil"));
        assert_eq!(options.since.as_deref(), Some("2024-01-01"));
        assert_eq!(options.sort_by, models::SortKey::Lines);
        assert!(options.exclude_bots);
        assert_eq!(options.min_commits, 5);
        assert_eq!(options.exclude_repos, vec!["legacy"]);
        assert_eq!(options.concurrency, 2);
        assert!(!options.show_progress);
    }
}
