//! Issue tracker clients.
//!
//! Each tracker resolves an issue reference typed on the command line into an
//! [`Issue`] and can list the open issues assigned to the current user.

mod error;
mod github;
mod gitlab;
mod jira;
mod linear;
mod memory;

pub use error::TrackerError;
pub use github::GithubTracker;
pub use gitlab::GitlabTracker;
pub use jira::JiraTracker;
pub use linear::LinearTracker;
pub use memory::MemoryTracker;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Config;

/// Issue identifier: a number for GitHub/GitLab, a key like `PROJ-123` otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssueId {
    Number(u64),
    Key(String),
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueId::Number(n) => write!(f, "{}", n),
            IssueId::Key(k) => f.write_str(k),
        }
    }
}

impl From<u64> for IssueId {
    fn from(n: u64) -> Self {
        IssueId::Number(n)
    }
}

impl From<&str> for IssueId {
    fn from(key: &str) -> Self {
        IssueId::Key(key.to_string())
    }
}

fn default_issue_type() -> String {
    "issue".to_string()
}

/// Issue metadata used to name a branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    #[serde(rename = "type", default = "default_issue_type")]
    pub issue_type: String,
    pub title: String,
    pub assignee: Option<String>,
}

impl Issue {
    pub fn new(id: impl Into<IssueId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            issue_type: default_issue_type(),
            title: title.into(),
            assignee: None,
        }
    }

    pub fn with_type(mut self, issue_type: impl Into<String>) -> Self {
        self.issue_type = issue_type.into();
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }
}

/// Supported trackers, as named in `issue_tracker.name`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerKind {
    Github,
    Gitlab,
    Jira,
    Linear,
}

impl TrackerKind {
    pub fn all() -> &'static [TrackerKind] {
        &[
            TrackerKind::Github,
            TrackerKind::Gitlab,
            TrackerKind::Jira,
            TrackerKind::Linear,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TrackerKind::Github => "GitHub",
            TrackerKind::Gitlab => "GitLab",
            TrackerKind::Jira => "Jira",
            TrackerKind::Linear => "Linear",
        }
    }
}

#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Human-readable tracker name used in messages
    fn display_name(&self) -> &str;

    /// Issue references must be plain numbers
    fn numeric_issues(&self) -> bool;

    /// Open issues assigned to the authenticated user
    async fn list_issues(&self) -> Result<Vec<Issue>, TrackerError>;

    /// Fetch one issue by the reference the user typed
    async fn get_issue(&self, id: &str) -> Result<Issue, TrackerError>;
}

/// Build the tracker selected by `issue_tracker.name`
pub fn from_config(config: &Config) -> Result<Box<dyn IssueTracker>, TrackerError> {
    let kind = config.issue_tracker.name.ok_or_else(|| {
        TrackerError::not_configured(
            "gibr",
            "no issue tracker selected; run `gibr init` or set issue_tracker.name",
        )
    })?;

    let tracker: Box<dyn IssueTracker> = match kind {
        TrackerKind::Github => Box::new(GithubTracker::from_config(&config.github)?),
        TrackerKind::Gitlab => Box::new(GitlabTracker::from_config(&config.gitlab)?),
        TrackerKind::Jira => Box::new(JiraTracker::from_config(&config.jira)?),
        TrackerKind::Linear => Box::new(LinearTracker::from_config(&config.linear)?),
    };
    Ok(tracker)
}

/// Read a secret from the environment variable named in config
pub(crate) fn token_from_env(provider: &str, var: &str) -> Result<String, TrackerError> {
    match std::env::var(var) {
        Ok(token) if !token.is_empty() => Ok(token),
        _ => Err(TrackerError::not_configured(
            provider,
            format!("environment variable {} is not set", var),
        )),
    }
}

/// Map a non-success HTTP status to a [`TrackerError`], passing successes through
pub(crate) async fn check_response(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, TrackerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let path = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();

    Err(match status.as_u16() {
        401 => TrackerError::unauthorized(provider),
        403 => TrackerError::forbidden(provider),
        404 => TrackerError::not_found(provider, path),
        429 => TrackerError::rate_limited(provider, retry_after),
        code => TrackerError::http(provider, code, body),
    })
}

/// Prefix a bare issue number with a project or team key
pub(crate) fn qualify_key(id: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) => {
            format!("{}-{}", prefix, id)
        }
        _ => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_json_shape() {
        let issue = Issue::new(10, "Bug").with_assignee("me");
        let json = serde_json::to_string(&issue).unwrap();
        assert_eq!(
            json,
            r#"{"id":10,"type":"issue","title":"Bug","assignee":"me"}"#
        );

        let keyed = Issue::new("ENG-7", "Task").with_type("Story");
        let value = serde_json::to_value(&keyed).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": "ENG-7", "type": "Story", "title": "Task", "assignee": null})
        );
    }

    #[test]
    fn test_issue_deserialize_defaults_type() {
        let issue: Issue =
            serde_json::from_str(r#"{"id": 3, "title": "Fix", "assignee": null}"#).unwrap();
        assert_eq!(issue.id, IssueId::Number(3));
        assert_eq!(issue.issue_type, "issue");
    }

    #[test]
    fn test_qualify_key() {
        assert_eq!(qualify_key("123", Some("PROJ")), "PROJ-123");
        assert_eq!(qualify_key("PROJ-123", Some("PROJ")), "PROJ-123");
        assert_eq!(qualify_key("123", None), "123");
        assert_eq!(qualify_key("", Some("PROJ")), "");
    }

    #[test]
    fn test_from_config_requires_tracker_name() {
        let config = Config::default();
        let err = from_config(&config).err().unwrap();
        assert!(matches!(err, TrackerError::NotConfigured { .. }));
    }

    #[test]
    fn test_tracker_kind_names() {
        let names: Vec<_> = TrackerKind::all()
            .iter()
            .map(|k| serde_json::to_string(k).unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["\"github\"", "\"gitlab\"", "\"jira\"", "\"linear\""]
        );
        assert_eq!(TrackerKind::Gitlab.display_name(), "GitLab");
    }
}
