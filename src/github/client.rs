//! GitHub REST API client.
//!
//! Implements [`ForgeClient`] with reqwest. Every request is paced by the
//! shared [`RateLimitMonitor`] and list endpoints are followed page by page.

use super::error::ForgeError;
use super::rate_limit::RateLimitMonitor;
use super::{
    CommitRecord, ContributorWeeklyStats, ForgeClient, IssueRecord, PullRequestRecord, RepoSummary,
};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Settings for the GitHub client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, without trailing slash.
    pub api_url: String,
    /// Personal access token.
    pub token: String,
    /// Page size for list endpoints (1..=100).
    pub per_page: u32,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Pause when this many calls or fewer remain.
    pub rate_limit_threshold: u64,
    /// Polls of the contributor-stats endpoint while it answers 202.
    pub stats_retries: u32,
    /// Delay between those polls.
    pub stats_retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            token: String::new(),
            per_page: 100,
            timeout_seconds: 30,
            rate_limit_threshold: super::rate_limit::DEFAULT_THRESHOLD,
            stats_retries: 3,
            stats_retry_delay: Duration::from_secs(2),
        }
    }
}

impl ClientConfig {
    /// Build client settings from the `[github]` config section.
    pub fn from_config(config: &crate::config::GitHubConfig, token: &str) -> Self {
        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            per_page: config.per_page.clamp(1, 100),
            timeout_seconds: config.timeout_seconds,
            rate_limit_threshold: config.rate_limit_threshold,
            stats_retries: config.stats_retries,
            stats_retry_delay: Duration::from_secs(config.stats_retry_delay_seconds),
        }
    }
}

/// GitHub implementation of [`ForgeClient`].
pub struct GitHubClient {
    config: ClientConfig,
    http: reqwest::Client,
    rate_limit: Arc<RateLimitMonitor>,
}

impl GitHubClient {
    /// Create a client with its own rate-limit monitor.
    pub fn new(config: ClientConfig) -> Result<Self, ForgeError> {
        let monitor = Arc::new(RateLimitMonitor::new(config.rate_limit_threshold));
        Self::with_monitor(config, monitor)
    }

    /// Create a client sharing an existing rate-limit monitor.
    pub fn with_monitor(
        config: ClientConfig,
        rate_limit: Arc<RateLimitMonitor>,
    ) -> Result<Self, ForgeError> {
        info!("Initializing GitHub client for {}", config.api_url);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("vibe-stats/", env!("CARGO_PKG_VERSION")))
            .default_headers(default_headers(&config.token))
            .build()?;

        Ok(Self {
            config,
            http,
            rate_limit,
        })
    }

    /// The monitor pacing this client's requests.
    pub fn rate_limit(&self) -> &Arc<RateLimitMonitor> {
        &self.rate_limit
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url, path)
    }

    /// Send one GET request, paced by the rate-limit monitor.
    async fn send(&self, url: &str, query: &[(&str, String)]) -> Result<Response, ForgeError> {
        self.rate_limit.wait_if_needed().await;

        debug!("GET {} {:?}", url, query);
        let response = self.http.get(url).query(query).send().await?;
        self.rate_limit.update(response.headers()).await;

        Ok(response)
    }

    /// GET a single JSON document.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ForgeError> {
        let response = self.send(url, &[]).await?;
        let response = check_status(response, url).await?;
        decode(response, url).await
    }

    /// GET every page of a list endpoint.
    ///
    /// A 409 answer (empty repository) ends the listing with what was
    /// collected so far.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ForgeError> {
        let per_page = self.config.per_page;
        let mut items = Vec::new();
        let mut page: u32 = 1;

        loop {
            let mut params = query.to_vec();
            params.push(("per_page", per_page.to_string()));
            params.push(("page", page.to_string()));

            let response = self.send(url, &params).await?;
            if response.status() == StatusCode::CONFLICT {
                debug!("{} answered 409, treating as empty", url);
                break;
            }

            let more = has_next_page(response.headers());
            let response = check_status(response, url).await?;
            let batch: Vec<T> = decode(response, url).await?;
            let count = batch.len();
            items.extend(batch);

            if !more || count < per_page as usize {
                break;
            }
            page += 1;
        }

        debug!("{}: {} items over {} page(s)", url, items.len(), page);
        Ok(items)
    }
}

impl ForgeClient for GitHubClient {
    async fn list_repos(
        &self,
        org: &str,
        include_forks: bool,
    ) -> Result<Vec<RepoSummary>, ForgeError> {
        let query = [("type", "all".to_string())];
        let repos: Vec<RepoSummary> = match self
            .get_paginated(&self.url(&format!("/orgs/{}/repos", org)), &query)
            .await
        {
            Ok(repos) => repos,
            Err(e) if e.is_not_found() => {
                info!("{} is not an organization, listing user repositories", org);
                let query = [("type", "owner".to_string())];
                self.get_paginated(&self.url(&format!("/users/{}/repos", org)), &query)
                    .await?
            }
            Err(e) => return Err(e),
        };

        Ok(repos
            .into_iter()
            .filter(|r| include_forks || !r.fork)
            .collect())
    }

    async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        since: Option<&str>,
        until: Option<&str>,
    ) -> Result<Vec<CommitRecord>, ForgeError> {
        let mut query = Vec::new();
        if let Some(since) = since {
            query.push(("since", since.to_string()));
        }
        if let Some(until) = until {
            query.push(("until", until.to_string()));
        }

        self.get_paginated(&self.url(&format!("/repos/{}/{}/commits", owner, repo)), &query)
            .await
    }

    async fn get_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<BTreeMap<String, u64>, ForgeError> {
        self.get_json(&self.url(&format!("/repos/{}/{}/languages", owner, repo)))
            .await
    }

    async fn get_contributor_stats(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<ContributorWeeklyStats>, ForgeError> {
        let url = self.url(&format!("/repos/{}/{}/stats/contributors", owner, repo));

        for attempt in 0..=self.config.stats_retries {
            let response = self.send(&url, &[]).await?;
            match response.status() {
                StatusCode::ACCEPTED => {
                    if attempt < self.config.stats_retries {
                        debug!(
                            "Contributor stats for {}/{} not ready (attempt {}), retrying",
                            owner,
                            repo,
                            attempt + 1
                        );
                        tokio::time::sleep(self.config.stats_retry_delay).await;
                    }
                }
                StatusCode::NO_CONTENT => return Ok(Vec::new()),
                _ => {
                    let response = check_status(response, &url).await?;
                    return decode(response, &url).await;
                }
            }
        }

        warn!("Contributor stats for {}/{} never became ready", owner, repo);
        Err(ForgeError::StatsUnavailable {
            repo: format!("{}/{}", owner, repo),
        })
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<PullRequestRecord>, ForgeError> {
        let query = [("state", "all".to_string())];
        self.get_paginated(&self.url(&format!("/repos/{}/{}/pulls", owner, repo)), &query)
            .await
    }

    async fn list_issues(&self, owner: &str, repo: &str) -> Result<Vec<IssueRecord>, ForgeError> {
        let query = [("state", "all".to_string())];
        let issues: Vec<IssueRecord> = self
            .get_paginated(&self.url(&format!("/repos/{}/{}/issues", owner, repo)), &query)
            .await?;

        Ok(issues.into_iter().filter(|i| !i.is_pull_request()).collect())
    }
}

fn default_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );
    headers.insert(
        "x-github-api-version",
        HeaderValue::from_static("2022-11-28"),
    );
    if let Ok(mut value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
    } else {
        warn!("Token contains characters not allowed in a header, sending unauthenticated");
    }
    headers
}

/// Turn a non-success response into [`ForgeError::Status`].
async fn check_status(response: Response, url: &str) -> Result<Response, ForgeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ForgeError::Status {
        status,
        url: url.to_string(),
        body: truncate(&body, 200),
    })
}

async fn decode<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ForgeError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|source| ForgeError::Decode {
        url: url.to_string(),
        source,
    })
}

/// Whether a `Link` header advertises a next page.
fn has_next_page(headers: &HeaderMap) -> bool {
    headers
        .get(header::LINK)
        .and_then(|v| v.to_str().ok())
        .map(|link| {
            link.split(',')
                .any(|part| part.split(';').skip(1).any(|p| p.trim() == "rel=\"next\""))
        })
        .unwrap_or(false)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
