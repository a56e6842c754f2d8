//! GitLab Issues tracker

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{check_response, token_from_env, Issue, IssueTracker, TrackerError};
use crate::config::GitlabConfig;

const PROVIDER_NAME: &str = "gitlab";

/// GitLab REST v4 client scoped to one project
pub struct GitlabTracker {
    base_url: String,
    project: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    iid: u64,
    title: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    issue_type: Option<String>,
    assignee: Option<UserResponse>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    username: String,
}

impl From<IssueResponse> for Issue {
    fn from(response: IssueResponse) -> Self {
        let mut issue = Issue::new(response.iid, response.title);
        if let Some(kind) = response.labels.into_iter().next().or(response.issue_type) {
            issue = issue.with_type(kind);
        }
        if let Some(user) = response.assignee {
            issue = issue.with_assignee(user.username);
        }
        issue
    }
}

/// Percent-encode a project path for use as a single URL path segment
fn encode_segment(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

impl GitlabTracker {
    pub fn new(
        base_url: &str,
        project: &str,
        token: impl Into<String>,
    ) -> Result<Self, TrackerError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("gibr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TrackerError::network(PROVIDER_NAME, e.to_string()))?;

        Ok(Self {
            base_url: format!("{}/api/v4", base_url.trim_end_matches('/')),
            project: encode_segment(project),
            token: token.into(),
            client,
        })
    }

    pub fn from_config(config: &GitlabConfig) -> Result<Self, TrackerError> {
        let project = config.project.as_deref().ok_or_else(|| {
            TrackerError::not_configured(PROVIDER_NAME, "gitlab.project is not set")
        })?;
        let token = token_from_env(PROVIDER_NAME, &config.token_env)?;
        Self::new(&config.url, project, token)
    }

    fn project_url(&self, path: &str) -> String {
        format!("{}/projects/{}{}", self.base_url, self.project, path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TrackerError> {
        debug!("GitLab GET: {}", url);

        let response = self
            .client
            .get(url)
            .query(query)
            .header("PRIVATE-TOKEN", &self.token)
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
impl IssueTracker for GitlabTracker {
    fn display_name(&self) -> &str {
        "GitLab"
    }

    fn numeric_issues(&self) -> bool {
        true
    }

    async fn list_issues(&self) -> Result<Vec<Issue>, TrackerError> {
        let issues: Vec<IssueResponse> = self
            .get(
                &self.project_url("/issues"),
                &[
                    ("state", "opened"),
                    ("scope", "assigned_to_me"),
                    ("per_page", "100"),
                ],
            )
            .await?;
        Ok(issues.into_iter().map(Issue::from).collect())
    }

    async fn get_issue(&self, id: &str) -> Result<Issue, TrackerError> {
        let issue: IssueResponse = self
            .get(&self.project_url(&format!("/issues/{}", id)), &[])
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
    fn test_encode_segment() {
        assert_eq!(encode_segment("group/sub group/app"), "group%2Fsub%20group%2Fapp");
        assert_eq!(encode_segment("1234"), "1234");
        assert_eq!(encode_segment("my-app_v1.0"), "my-app_v1.0");
    }

    #[test]
    fn test_project_url() {
        let tracker = GitlabTracker::new("https://gitlab.example.com/", "acme/app", "t").unwrap();
        assert_eq!(
            tracker.project_url("/issues/3"),
            "https://gitlab.example.com/api/v4/projects/acme%2Fapp/issues/3"
        );
        assert!(tracker.numeric_issues());
    }

    #[test]
    fn test_from_config_requires_project() {
        let config = GitlabConfig::default();
        let result = GitlabTracker::from_config(&config);
        assert!(matches!(result, Err(TrackerError::NotConfigured { .. })));
    }

    #[test]
    fn test_issue_from_response() {
        let response: IssueResponse = serde_json::from_str(
            r#"{
                "iid": 12,
                "title": "Slow query",
                "labels": [],
                "issue_type": "incident",
                "assignee": {"username": "dev"}
            }"#,
        )
        .unwrap();

        let issue = Issue::from(response);
        assert_eq!(issue.id, IssueId::Number(12));
        assert_eq!(issue.issue_type, "incident");
        assert_eq!(issue.assignee.as_deref(), Some("dev"));
    }

    #[test]
    fn test_label_wins_over_issue_type() {
        let response: IssueResponse = serde_json::from_str(
            r#"{"iid": 1, "title": "t", "labels": ["feature"], "issue_type": "issue", "assignee": null}"#,
        )
        .unwrap();
        assert_eq!(Issue::from(response).issue_type, "feature");
    }
}
