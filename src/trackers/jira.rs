//! Jira Cloud tracker

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{check_response, qualify_key, token_from_env, Issue, IssueTracker, TrackerError};
use crate::config::JiraConfig;

const PROVIDER_NAME: &str = "jira";
const ISSUE_FIELDS: &str = "summary,issuetype,assignee";

lazy_static! {
    static ref JIRA_KEY: Regex = Regex::new(r"^[A-Z][A-Z0-9]*-\d+$").unwrap();
}

/// Jira Cloud API client
pub struct JiraTracker {
    base_url: String,
    user: String,
    api_token: String,
    project_key: Option<String>,
    client: Client,
}

// Jira API response types
#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    fields: JiraIssueFields,
}

#[derive(Debug, Deserialize)]
struct JiraIssueFields {
    summary: String,
    issuetype: Option<JiraIssueType>,
    assignee: Option<JiraUser>,
}

#[derive(Debug, Deserialize)]
struct JiraIssueType {
    name: String,
}

#[derive(Debug, Deserialize)]
struct JiraUser {
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct JiraSearchResponse {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

impl From<JiraIssue> for Issue {
    fn from(jira: JiraIssue) -> Self {
        let mut issue = Issue::new(jira.key.as_str(), jira.fields.summary);
        if let Some(kind) = jira.fields.issuetype {
            issue = issue.with_type(kind.name);
        }
        if let Some(user) = jira.fields.assignee {
            issue = issue.with_assignee(user.display_name);
        }
        issue
    }
}

impl JiraTracker {
    pub fn new(
        base_url: &str,
        user: impl Into<String>,
        api_token: impl Into<String>,
        project_key: Option<String>,
    ) -> Self {
        Self {
            base_url: format!("{}/rest/api/3", base_url.trim_end_matches('/')),
            user: user.into(),
            api_token: api_token.into(),
            project_key,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &JiraConfig) -> Result<Self, TrackerError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| TrackerError::not_configured(PROVIDER_NAME, "jira.url is not set"))?;
        let user = config
            .user
            .as_deref()
            .ok_or_else(|| TrackerError::not_configured(PROVIDER_NAME, "jira.user is not set"))?;
        let token = token_from_env(PROVIDER_NAME, &config.token_env)?;
        Ok(Self::new(url, user, token, config.project_key.clone()))
    }

    /// Looks like a Jira key: uppercase project, dash, number (`ABC-123`)
    pub fn is_jira_issue(value: &str) -> bool {
        JIRA_KEY.is_match(value)
    }

    /// Full issue key for what the user typed
    fn issue_key(&self, id: &str) -> String {
        qualify_key(id, self.project_key.as_deref())
    }

    fn search_jql(&self) -> String {
        match &self.project_key {
            Some(key) => format!(
                "project = \"{}\" AND assignee = currentUser() AND resolution = Unresolved ORDER BY updated DESC",
                key
            ),
            None => "assignee = currentUser() AND resolution = Unresolved ORDER BY updated DESC"
                .to_string(),
        }
    }

    /// Make an authenticated GET request
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TrackerError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Jira GET: {}", url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .basic_auth(&self.user, Some(&self.api_token))
            .header("Accept", "application/json")
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
impl IssueTracker for JiraTracker {
    fn display_name(&self) -> &str {
        "Jira"
    }

    fn numeric_issues(&self) -> bool {
        false
    }

    async fn list_issues(&self) -> Result<Vec<Issue>, TrackerError> {
        let jql = self.search_jql();
        let response: JiraSearchResponse = self
            .get(
                "/search/jql",
                &[
                    ("jql", jql.as_str()),
                    ("fields", ISSUE_FIELDS),
                    ("maxResults", "100"),
                ],
            )
            .await?;
        Ok(response.issues.into_iter().map(Issue::from).collect())
    }

    async fn get_issue(&self, id: &str) -> Result<Issue, TrackerError> {
        let key = self.issue_key(id);
        let issue: JiraIssue = self
            .get(&format!("/issue/{}", key), &[("fields", ISSUE_FIELDS)])
            .await
            .map_err(|e| e.for_issue(&key))?;
        Ok(issue.into())
    }
}
