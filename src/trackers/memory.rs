//! In-memory tracker for exercising commands without network access.

use async_trait::async_trait;

use super::{Issue, IssueTracker, TrackerError};

#[derive(Debug, Clone)]
pub struct MemoryTracker {
    display_name: String,
    numeric: bool,
    issues: Vec<Issue>,
}

impl MemoryTracker {
    pub fn new(display_name: impl Into<String>, numeric: bool) -> Self {
        Self {
            display_name: display_name.into(),
            numeric,
            issues: Vec::new(),
        }
    }

    pub fn with_issue(mut self, issue: Issue) -> Self {
        self.issues.push(issue);
        self
    }
}

#[async_trait]
impl IssueTracker for MemoryTracker {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn numeric_issues(&self) -> bool {
        self.numeric
    }

    async fn list_issues(&self) -> Result<Vec<Issue>, TrackerError> {
        Ok(self.issues.clone())
    }

    async fn get_issue(&self, id: &str) -> Result<Issue, TrackerError> {
        self.issues
            .iter()
            .find(|issue| issue.id.to_string() == id)
            .cloned()
            .ok_or_else(|| TrackerError::not_found(&self.display_name, format!("issue {}", id)))
    }
}
