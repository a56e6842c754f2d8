use anyhow::{Context as _, Result};
use std::io::Write;

use super::Context;
use crate::branch_name::format_branch_name;
use crate::error::Aborted;
use crate::git::RepositoryOpener;
use crate::trackers::IssueTracker;
use crate::workflow::{BranchRequest, BranchWorkflow, WorkflowOutcome};

/// `gibr create <issue>`: fetch the issue, name the branch, run the branch workflow
pub async fn run(
    ctx: &Context<'_>,
    tracker: &dyn IssueTracker,
    opener: &dyn RepositoryOpener,
    issue_ref: &str,
    dry_run: bool,
    out: &mut dyn Write,
) -> Result<WorkflowOutcome> {
    let is_number = !issue_ref.is_empty() && issue_ref.bytes().all(|b| b.is_ascii_digit());
    if tracker.numeric_issues() && !is_number {
        ctx.notifier.error(&format!(
            "Issue number must be numeric for {} issue tracker.",
            tracker.display_name()
        ));
        return Err(Aborted.into());
    }

    let issue = tracker
        .get_issue(issue_ref)
        .await
        .with_context(|| format!("Failed to fetch issue {}", issue_ref))?;

    writeln!(
        out,
        "Generating branch name for issue #{}: {}",
        issue.id, issue.title
    )?;

    let branch = match format_branch_name(&ctx.config.default.branch_name_format, &issue) {
        Ok(branch) => branch,
        Err(err) => {
            ctx.notifier.error(&err.to_string());
            return Err(Aborted.into());
        }
    };
    writeln!(out, "{}", branch)?;

    let request = BranchRequest::new(branch, ctx.config.default.push, dry_run);
    let outcome = BranchWorkflow::new(opener, ctx.notifier, ctx.prompter)
        .create_and_push_branch(request)
        .await?;

    // Reported by the workflow already, but the command itself failed
    if outcome == WorkflowOutcome::NotARepository {
        return Err(Aborted.into());
    }
    Ok(outcome)
}
