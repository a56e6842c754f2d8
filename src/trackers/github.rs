//! GitHub Issues tracker

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{check_response, token_from_env, Issue, IssueTracker, TrackerError};
use crate::config::GithubConfig;

const GITHUB_API_VERSION: &str = "2022-11-28";
const PROVIDER_NAME: &str = "github";

/// GitHub REST v3 client scoped to one repository
pub struct GithubTracker {
    owner: String,
    repo: String,
    token: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    number: u64,
    title: String,
    #[serde(default)]
    labels: Vec<LabelResponse>,
    assignee: Option<UserResponse>,
    /// Present only when the "issue" is really a pull request
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct LabelResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

impl From<IssueResponse> for Issue {
    fn from(response: IssueResponse) -> Self {
        let mut issue = Issue::new(response.number, response.title);
        if let Some(label) = response.labels.into_iter().next() {
            issue = issue.with_type(label.name);
        }
        if let Some(user) = response.assignee {
            issue = issue.with_assignee(user.login);
        }
        issue
    }
}

impl GithubTracker {
    pub fn new(
        repo: &str,
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, TrackerError> {
        let (owner, name) = Self::parse_repo(repo).ok_or_else(|| {
            TrackerError::not_configured(
                PROVIDER_NAME,
                format!("invalid repo '{}', expected 'owner/name'", repo),
            )
        })?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("gibr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TrackerError::network(PROVIDER_NAME, e.to_string()))?;

        Ok(Self {
            owner: owner.to_string(),
            repo: name.to_string(),
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &GithubConfig) -> Result<Self, TrackerError> {
        let repo = config
            .repo
            .as_deref()
            .ok_or_else(|| TrackerError::not_configured(PROVIDER_NAME, "github.repo is not set"))?;
        let token = token_from_env(PROVIDER_NAME, &config.token_env)?;
        Self::new(repo, token, config.url.as_str())
    }

    /// Split `owner/name`
    pub fn parse_repo(repo: &str) -> Option<(&str, &str)> {
        let (owner, name) = repo.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some((owner, name))
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.base_url, self.owner, self.repo, path
        )
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TrackerError> {
        debug!("GitHub GET: {}", url);

        let response = self
            .client
            .get(url)
            .query(query)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await
            .map_err(|e| TrackerError::network(PROVIDER_NAME, e.to_string()))?;

        check_response(PROVIDER_NAME, response)
            .await?
            .json()
            .await
            .map_err(|e| TrackerError::parse(PROVIDER_NAME, e.to_string()))
    }
}

#[async_trait]
impl IssueTracker for GithubTracker {
    fn display_name(&self) -> &str {
        "GitHub"
    }

    fn numeric_issues(&self) -> bool {
        true
    }

    async fn list_issues(&self) -> Result<Vec<Issue>, TrackerError> {
        let me: UserResponse = self
            .get(&format!("{}/user", self.base_url), &[])
            .await?;

        let issues: Vec<IssueResponse> = self
            .get(
                &self.repo_url("/issues"),
                &[
                    ("state", "open"),
                    ("assignee", me.login.as_str()),
                    ("per_page", "100"),
                ],
            )
            .await?;

        Ok(issues
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(Issue::from)
            .collect())
    }

    async fn get_issue(&self, id: &str) -> Result<Issue, TrackerError> {
        let issue: IssueResponse = self
            .get(&self.repo_url(&format!("/issues/{}", id)), &[])
            .await
            .map_err(|e| e.for_issue(id))?;
        Ok(issue.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trackers::IssueId;

    #[test]
    fn test_parse_repo() {
        assert_eq!(
            GithubTracker::parse_repo("owner/repo"),
            Some(("owner", "repo"))
        );
        assert_eq!(GithubTracker::parse_repo("invalid"), None);
        assert_eq!(GithubTracker::parse_repo("a/b/c"), None);
        assert_eq!(GithubTracker::parse_repo("/repo"), None);
    }

    #[test]
    fn test_new_rejects_bad_repo() {
        let result = GithubTracker::new("nope", "token", "https://api.github.com");
        assert!(matches!(result, Err(TrackerError::NotConfigured { .. })));
    }

    #[test]
    fn test_repo_url() {
        let tracker =
            GithubTracker::new("acme/widgets", "token", "https://ghe.example.com/api/v3/").unwrap();
        assert_eq!(
            tracker.repo_url("/issues/5"),
            "https://ghe.example.com/api/v3/repos/acme/widgets/issues/5"
        );
        assert!(tracker.numeric_issues());
        assert_eq!(tracker.display_name(), "GitHub");
    }

    #[test]
    fn test_issue_from_response() {
        let response: IssueResponse = serde_json::from_str(
            r#"{
                "number": 42,
                "title": "Crash on start",
                "labels": [{"name": "bug"}, {"name": "p1"}],
                "assignee": {"login": "octocat"}
            }"#,
        )
        .unwrap();

        let issue = Issue::from(response);
        assert_eq!(issue.id, IssueId::Number(42));
        assert_eq!(issue.issue_type, "bug");
        assert_eq!(issue.title, "Crash on start");
        assert_eq!(issue.assignee.as_deref(), Some("octocat"));
    }

    #[test]
    fn test_issue_without_labels_or_assignee() {
        let response: IssueResponse =
            serde_json::from_str(r#"{"number": 7, "title": "Docs", "assignee": null}"#).unwrap();

        let issue = Issue::from(response);
        assert_eq!(issue.issue_type, "issue");
        assert_eq!(issue.assignee, None);
    }

    #[test]
    fn test_pull_requests_are_marked() {
        let response: IssueResponse = serde_json::from_str(
            r#"{"number": 8, "title": "PR", "assignee": null, "pull_request": {"url": "x"}}"#,
        )
        .unwrap();
        assert!(response.pull_request.is_some());
    }
}
