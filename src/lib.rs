//! gibr - create git branches from issue tracker issues
//!
//! `gibr 123` fetches issue 123 from the configured tracker (GitHub, GitLab,
//! Jira or Linear), turns it into a branch name, then creates and checks out
//! that branch and optionally pushes it to `origin`.

pub mod branch_name;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod logging;
pub mod notify;
pub mod prompt;
pub mod trackers;
pub mod workflow;
