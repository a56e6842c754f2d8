//! Branch creation workflow.
//!
//! Turns a desired branch name into a local (and optionally pushed) branch:
//!
//! 1. open the repository and validate its state (dirty tree and detached
//!    HEAD are advisories, a repository without commits is fatal)
//! 2. resolve a clash with an existing local branch, asking the user for a
//!    suffix when needed
//! 3. create, check out and push the branch, or describe those steps in
//!    dry-run mode without touching the repository
//!
//! Every step is reported through the injected [`Notifier`]. Failures that
//! end the command are reported first and then returned as [`Aborted`].

use std::fmt::Display;
use tracing::debug;

use crate::error::Aborted;
use crate::git::{GitError, PushOutcome, Repository, RepositoryOpener};
use crate::notify::Notifier;
use crate::prompt::Prompter;

/// Remote that branches are pushed to
pub const PUSH_REMOTE: &str = "origin";

/// Suffix offered when the requested branch already exists
pub const DEFAULT_SUFFIX: &str = "take2";

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRequest {
    name: String,
    push: bool,
    dry_run: bool,
}

impl BranchRequest {
    pub fn new(name: impl Into<String>, push: bool, dry_run: bool) -> Self {
        Self {
            name: name.into(),
            push,
            dry_run,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push(&self) -> bool {
        self.push
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Same request for `<name>-<suffix>`
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self {
            name: format!("{}-{}", self.name, suffix),
            ..self.clone()
        }
    }
}

/// How a workflow run ended without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// The branch was created and checked out (and pushed if requested)
    Complete { branch: String },
    /// Dry run: the steps for `branch` were described, nothing changed
    DryRun { branch: String },
    /// The requested branch is already the checked-out branch
    AlreadyCheckedOut,
    /// Dry run hit an existing branch and stopped before prompting
    DryRunConflict,
    /// The user declined to pick a suffixed name
    Canceled,
    /// The working directory is not inside a git repository
    NotARepository,
}

enum Resolution {
    Proceed(BranchRequest),
    Stop(WorkflowOutcome),
}

/// Drives branch creation against a repository handle
pub struct BranchWorkflow<'a> {
    opener: &'a dyn RepositoryOpener,
    notifier: &'a dyn Notifier,
    prompter: &'a dyn Prompter,
}

impl<'a> BranchWorkflow<'a> {
    pub fn new(
        opener: &'a dyn RepositoryOpener,
        notifier: &'a dyn Notifier,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            opener,
            notifier,
            prompter,
        }
    }

    /// Create the requested branch, check it out and optionally push it.
    ///
    /// The repository handle is released before this returns, on every path.
    pub async fn create_and_push_branch(
        &self,
        request: BranchRequest,
    ) -> Result<WorkflowOutcome, Aborted> {
        let repo = match self.opener.open().await {
            Ok(repo) => repo,
            Err(GitError::NotARepository) => {
                self.notifier
                    .error("Not a git repository (or any of the parent directories).");
                return Ok(WorkflowOutcome::NotARepository);
            }
            Err(err) => return Err(self.git_failure(err)),
        };

        let result = self.run(repo.as_ref(), request).await;
        drop(repo);
        result
    }

    async fn run(
        &self,
        repo: &dyn Repository,
        request: BranchRequest,
    ) -> Result<WorkflowOutcome, Aborted> {
        self.validate(repo).await?;

        let active = self.git(repo.active_branch().await)?;
        let base = match &active {
            Some(branch) => branch.clone(),
            None => self.git(repo.head_short_id().await)?,
        };
        debug!(current = %base, requested = request.name(), "Resolved base");

        let request = if self.git(repo.branch_exists(request.name()).await)? {
            match self
                .resolve_conflict(repo, request, active.as_deref())
                .await?
            {
                Resolution::Proceed(request) => request,
                Resolution::Stop(outcome) => return Ok(outcome),
            }
        } else {
            request
        };

        self.execute(repo, &request, &base).await
    }

    /// Emit advisories; fail only when there is no commit to branch from
    async fn validate(&self, repo: &dyn Repository) -> Result<(), Aborted> {
        if self.git(repo.is_dirty().await)? {
            self.notifier
                .warning("Working tree is dirty — uncommitted changes present.");
        }

        if !self.git(repo.head_is_valid().await)? {
            self.notifier
                .error("Please make an initial commit before using gibr.");
            return Err(Aborted);
        }

        if self.git(repo.is_detached().await)? {
            self.notifier.warning("HEAD is detached (not on a branch).");
        }

        Ok(())
    }

    async fn resolve_conflict(
        &self,
        repo: &dyn Repository,
        request: BranchRequest,
        active: Option<&str>,
    ) -> Result<Resolution, Aborted> {
        let name = request.name();

        if active == Some(name) {
            self.notifier.warning(&format!(
                "Branch '{}' already exists and is checked out",
                name
            ));
            return Ok(Resolution::Stop(WorkflowOutcome::AlreadyCheckedOut));
        }

        self.notifier
            .warning(&format!("Branch '{}' already exists locally.", name));

        if request.dry_run() {
            self.notifier.info(&format!(
                "[DRY RUN] Would prompt to create branch with suffix since '{}' exists.",
                name
            ));
            return Ok(Resolution::Stop(WorkflowOutcome::DryRunConflict));
        }

        loop {
            let accepted = self.ask(
                self.prompter
                    .confirm("Would you like to create a new branch with a suffix?", true),
            )?;
            if !accepted {
                self.notifier.info("Operation canceled by user.");
                return Ok(Resolution::Stop(WorkflowOutcome::Canceled));
            }

            let suffix = self.ask(self.prompter.input("Enter suffix", DEFAULT_SUFFIX))?;
            let suffix = match suffix.trim() {
                "" => DEFAULT_SUFFIX,
                trimmed => trimmed,
            };
            let renamed = request.with_suffix(suffix);

            if !self.git(repo.branch_exists(renamed.name()).await)? {
                self.notifier.info(&format!(
                    "Creating new branch '{}' instead.",
                    renamed.name()
                ));
                return Ok(Resolution::Proceed(renamed));
            }

            // The suffixed name is taken too; ask again
            self.notifier.warning(&format!(
                "Branch '{}' already exists locally.",
                renamed.name()
            ));
        }
    }

    async fn execute(
        &self,
        repo: &dyn Repository,
        request: &BranchRequest,
        base: &str,
    ) -> Result<WorkflowOutcome, Aborted> {
        let name = request.name();

        if request.dry_run() {
            self.notifier.info(&format!(
                "[DRY RUN] Would create branch '{}' from {}.",
                name, base
            ));
            self.notifier
                .info(&format!("[DRY RUN] Would checkout branch: {}", name));
            if request.push() {
                self.notifier.info(&format!(
                    "[DRY RUN] Would push branch '{}' to {}.",
                    name, PUSH_REMOTE
                ));
            }
            return Ok(WorkflowOutcome::DryRun {
                branch: name.to_string(),
            });
        }

        self.git(repo.create_branch(name).await)?;
        self.notifier
            .success(&format!("Created branch '{}' from {}.", name, base));

        self.git(repo.checkout(name).await)?;
        self.notifier
            .success(&format!("Checked out branch: {}", name));

        if request.push() {
            self.git(repo.ensure_remote(PUSH_REMOTE).await)?;
            let refspec = format!("{}:{}", name, name);
            match self.git(repo.push(PUSH_REMOTE, &refspec, true).await)? {
                PushOutcome::Pushed => {}
                PushOutcome::Rejected { reason } => {
                    return Err(self.git_failure(GitError::command_failed("push", reason)));
                }
            }
            self.notifier
                .success(&format!("Pushed branch '{}' to {}.", name, PUSH_REMOTE));
        }

        Ok(WorkflowOutcome::Complete {
            branch: name.to_string(),
        })
    }

    /// Report a git failure; the caller returns the resulting [`Aborted`]
    fn git_failure(&self, err: GitError) -> Aborted {
        self.notifier.error(&format!("Git command failed: {}", err));
        Aborted
    }

    fn git<T>(&self, result: Result<T, GitError>) -> Result<T, Aborted> {
        result.map_err(|err| self.git_failure(err))
    }

    fn ask<T, E: Display>(&self, result: Result<T, E>) -> Result<T, Aborted> {
        result.map_err(|err| {
            self.notifier.error(&format!("Prompt failed: {}", err));
            Aborted
        })
    }
}
