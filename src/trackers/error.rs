//! Tracker API error types

use thiserror::Error;

/// Errors that can occur when talking to an issue tracker
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackerError {
    /// Required settings or credentials are missing
    #[error("{provider}: not configured ({detail})")]
    NotConfigured { provider: String, detail: String },

    /// 401 Unauthorized - token invalid or expired
    #[error("{provider}: Unauthorized (401) - check your API token")]
    Unauthorized { provider: String },

    /// 403 Forbidden - token lacks required permissions
    #[error("{provider}: Forbidden (403) - insufficient permissions")]
    Forbidden { provider: String },

    #[error("{provider}: {what} not found")]
    NotFound { provider: String, what: String },

    /// 429 Rate Limited
    #[error("{provider}: Rate limited{}", retry_suffix(.retry_after_secs))]
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// Network or timeout error
    #[error("{provider}: Network error - {message}")]
    Network { provider: String, message: String },

    /// Other HTTP errors
    #[error("{provider}: HTTP {status} - {message}")]
    Http {
        provider: String,
        status: u16,
        message: String,
    },

    /// The response body did not have the expected shape
    #[error("{provider}: Parse error - {message}")]
    Parse { provider: String, message: String },
}

fn retry_suffix(secs: &Option<u64>) -> String {
    secs.map(|s| format!(" - retry after {}s", s))
        .unwrap_or_default()
}

impl TrackerError {
    /// Check if this is an authentication error (401 or 403)
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            TrackerError::Unauthorized { .. } | TrackerError::Forbidden { .. }
        )
    }

    pub fn not_configured(provider: impl Into<String>, detail: impl Into<String>) -> Self {
        TrackerError::NotConfigured {
            provider: provider.into(),
            detail: detail.into(),
        }
    }

    pub fn unauthorized(provider: impl Into<String>) -> Self {
        TrackerError::Unauthorized {
            provider: provider.into(),
        }
    }

    pub fn forbidden(provider: impl Into<String>) -> Self {
        TrackerError::Forbidden {
            provider: provider.into(),
        }
    }

    pub fn not_found(provider: impl Into<String>, what: impl Into<String>) -> Self {
        TrackerError::NotFound {
            provider: provider.into(),
            what: what.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, retry_after: Option<u64>) -> Self {
        TrackerError::RateLimited {
            provider: provider.into(),
            retry_after_secs: retry_after,
        }
    }

    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        TrackerError::Network {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn http(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        TrackerError::Http {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn parse(provider: impl Into<String>, message: impl Into<String>) -> Self {
        TrackerError::Parse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Rewrite a generic not-found into one naming the requested issue
    pub fn for_issue(self, id: &str) -> Self {
        match self {
            TrackerError::NotFound { provider, .. } => TrackerError::NotFound {
                provider,
                what: format!("issue {}", id),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_auth_error() {
        assert!(TrackerError::unauthorized("github").is_auth_error());
        assert!(TrackerError::forbidden("github").is_auth_error());
        assert!(!TrackerError::rate_limited("github", None).is_auth_error());
        assert!(!TrackerError::network("github", "timeout").is_auth_error());
    }

    #[test]
    fn test_display() {
        let err = TrackerError::rate_limited("linear", Some(30));
        assert_eq!(err.to_string(), "linear: Rate limited - retry after 30s");

        let err = TrackerError::rate_limited("linear", None);
        assert_eq!(err.to_string(), "linear: Rate limited");

        let err = TrackerError::not_configured("jira", "environment variable JIRA_TOKEN is not set");
        assert_eq!(
            err.to_string(),
            "jira: not configured (environment variable JIRA_TOKEN is not set)"
        );
    }

    #[test]
    fn test_for_issue_rewrites_not_found_only() {
        let err = TrackerError::not_found("gitlab", "/api/v4/projects/1/issues/9").for_issue("9");
        assert_eq!(err.to_string(), "gitlab: issue 9 not found");

        let err = TrackerError::forbidden("gitlab").for_issue("9");
        assert_eq!(err, TrackerError::forbidden("gitlab"));
    }
}
