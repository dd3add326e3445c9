//! Error types for forge API calls.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by a forge client call.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Transport-level failure (connection, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("GitHub API returned {status} for {url}: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },

    /// The response body did not match the expected record shape.
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Contributor statistics were still being computed after every poll.
    #[error("Contributor statistics for {repo} are still being computed, try again later")]
    StatsUnavailable { repo: String },
}

impl ForgeError {
    /// Returns true if the API answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ForgeError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = ForgeError::Status {
            status: StatusCode::FORBIDDEN,
            url: "https://api.github.com/orgs/acme/repos".to_string(),
            body: "rate limited".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("403"));
        assert!(message.contains("/orgs/acme/repos"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_is_not_found() {
        let err = ForgeError::Status {
            status: StatusCode::NOT_FOUND,
            url: "https://api.github.com/orgs/ghost/repos".to_string(),
            body: String::new(),
        };
        assert!(err.is_not_found());

        let err = ForgeError::StatsUnavailable {
            repo: "acme/anvil".to_string(),
        };
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("acme/anvil"));
    }
}
