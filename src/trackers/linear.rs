//! Linear tracker

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_response, qualify_key, token_from_env, Issue, IssueTracker, TrackerError};
use crate::config::LinearConfig;

const LINEAR_API_URL: &str = "https://api.linear.app/graphql";
const PROVIDER_NAME: &str = "linear";

lazy_static! {
    static ref LINEAR_KEY: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9]*-\d+$").unwrap();
}

const ISSUE_QUERY: &str = r#"
    query($id: String!) {
        issue(id: $id) {
            identifier
            title
            labels { nodes { name } }
            assignee { name }
        }
    }
"#;

const ASSIGNED_ISSUES_QUERY: &str = r#"
    query {
        viewer {
            assignedIssues(
                first: 100
                filter: { state: { type: { nin: ["completed", "canceled"] } } }
            ) {
                nodes {
                    identifier
                    title
                    labels { nodes { name } }
                    assignee { name }
                }
            }
        }
    }
"#;

/// Linear GraphQL client
pub struct LinearTracker {
    api_key: String,
    team: Option<String>,
    client: Client,
}

// Linear GraphQL response types
#[derive(Debug, Deserialize)]
struct IssueData {
    issue: Option<LinearIssue>,
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: Viewer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Viewer {
    assigned_issues: Nodes<LinearIssue>,
}

#[derive(Debug, Deserialize)]
struct Nodes<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct LinearIssue {
    identifier: String,
    title: String,
    labels: Option<Nodes<LinearLabel>>,
    assignee: Option<LinearUser>,
}

#[derive(Debug, Deserialize)]
struct LinearLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct LinearUser {
    name: String,
}

impl From<LinearIssue> for Issue {
    fn from(linear: LinearIssue) -> Self {
        // Linear has no issue types; the first label stands in for one
        let mut issue = Issue::new(linear.identifier.as_str(), linear.title);
        if let Some(label) = linear.labels.and_then(|l| l.nodes.into_iter().next()) {
            issue = issue.with_type(label.name);
        }
        if let Some(user) = linear.assignee {
            issue = issue.with_assignee(user.name);
        }
        issue
    }
}

impl LinearTracker {
    pub fn new(api_key: impl Into<String>, team: Option<String>) -> Self {
        Self {
            api_key: api_key.into(),
            team,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &LinearConfig) -> Result<Self, TrackerError> {
        let api_key = token_from_env(PROVIDER_NAME, &config.api_key_env)?;
        Ok(Self::new(api_key, config.team.clone()))
    }

    /// Looks like a Linear identifier: team key, dash, number (`ENG-42`, `eng-42`)
    pub fn is_linear_issue(value: &str) -> bool {
        LINEAR_KEY.is_match(value)
    }

    fn identifier(&self, id: &str) -> String {
        qualify_key(id, self.team.as_deref()).to_uppercase()
    }

    fn in_team(&self, identifier: &str) -> bool {
        match &self.team {
            Some(team) => identifier
                .split_once('-')
                .is_some_and(|(prefix, _)| prefix.eq_ignore_ascii_case(team)),
            None => true,
        }
    }

    /// Execute a GraphQL query
    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<T, TrackerError> {
        #[derive(Serialize)]
        struct GraphQLRequest<'a> {
            query: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            variables: Option<serde_json::Value>,
        }

        #[derive(Deserialize)]
        struct GraphQLResponse<T> {
            data: Option<T>,
            errors: Option<Vec<GraphQLError>>,
        }

        #[derive(Deserialize)]
        struct GraphQLError {
            message: String,
        }

        debug!("Linear GraphQL query: {}", query.trim());

        let response = self
            .client
            .post(LINEAR_API_URL)
            .header("Authorization", &self.api_key)
            .json(&GraphQLRequest { query, variables })
            .send()
            .await
            .map_err(|e| TrackerError::network(PROVIDER_NAME, e.to_string()))?;

        let gql_response: GraphQLResponse<T> = check_response(PROVIDER_NAME, response)
            .await?
            .json()
            .await
            .map_err(|e| TrackerError::parse(PROVIDER_NAME, e.to_string()))?;

        if let Some(errors) = gql_response.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(TrackerError::http(PROVIDER_NAME, 200, messages.join("; ")));
        }

        gql_response
            .data
            .ok_or_else(|| TrackerError::parse(PROVIDER_NAME, "No data in response"))
    }
}

#[async_trait]
impl IssueTracker for LinearTracker {
    fn display_name(&self) -> &str {
        "Linear"
    }

    fn numeric_issues(&self) -> bool {
        false
    }

    async fn list_issues(&self) -> Result<Vec<Issue>, TrackerError> {
        let data: ViewerData = self.graphql(ASSIGNED_ISSUES_QUERY, None).await?;
        Ok(data
            .viewer
            .assigned_issues
            .nodes
            .into_iter()
            .filter(|issue| self.in_team(&issue.identifier))
            .map(Issue::from)
            .collect())
    }

    async fn get_issue(&self, id: &str) -> Result<Issue, TrackerError> {
        let identifier = self.identifier(id);
        let variables = serde_json::json!({ "id": identifier });
        let data: IssueData = self.graphql(ISSUE_QUERY, Some(variables)).await?;
        data.issue
            .map(Issue::from)
            .ok_or_else(|| TrackerError::not_found(PROVIDER_NAME, format!("issue {}", identifier)))
    }
}
