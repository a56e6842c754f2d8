//! Repository handle used by the branch workflow.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::cli::{rejected_refs, GitCli};
use super::GitError;

/// Result of a push that git itself managed to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed,
    /// The remote refused the ref; `reason` is git's summary line
    Rejected { reason: String },
}

/// A live handle to one local working copy.
///
/// Handles are owned by a single workflow run and released by dropping them.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Tracked files have uncommitted changes
    async fn is_dirty(&self) -> Result<bool, GitError>;

    /// HEAD points at a commit (false before the first commit)
    async fn head_is_valid(&self) -> Result<bool, GitError>;

    /// HEAD is not attached to a branch
    async fn is_detached(&self) -> Result<bool, GitError>;

    /// Name of the checked-out branch, `None` when detached
    async fn active_branch(&self) -> Result<Option<String>, GitError>;

    /// Abbreviated id of the HEAD commit
    async fn head_short_id(&self) -> Result<String, GitError>;

    /// A local branch with this name exists
    async fn branch_exists(&self, name: &str) -> Result<bool, GitError>;

    /// Create a branch at the current HEAD
    async fn create_branch(&self, name: &str) -> Result<(), GitError>;

    /// Check out an existing local branch
    async fn checkout(&self, name: &str) -> Result<(), GitError>;

    /// Fail with [`GitError::RemoteNotFound`] unless `remote` is configured
    async fn ensure_remote(&self, remote: &str) -> Result<(), GitError>;

    /// Push `refspec` to `remote`, optionally recording upstream tracking
    async fn push(
        &self,
        remote: &str,
        refspec: &str,
        set_upstream: bool,
    ) -> Result<PushOutcome, GitError>;
}

/// Acquires repository handles
#[async_trait]
pub trait RepositoryOpener: Send + Sync {
    /// Open the repository containing the current directory, searching parents
    async fn open(&self) -> Result<Box<dyn Repository>, GitError>;
}

/// Repository handle backed by the git CLI
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
}

impl GitRepository {
    /// Discover the repository containing `path`
    pub async fn discover(path: &Path) -> Result<Self, GitError> {
        let root = GitCli::repo_root(path).await?;
        debug!(root = %root.display(), "Opened repository");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Repository for GitRepository {
    async fn is_dirty(&self) -> Result<bool, GitError> {
        GitCli::is_dirty(&self.root).await
    }

    async fn head_is_valid(&self) -> Result<bool, GitError> {
        GitCli::has_commits(&self.root).await
    }

    async fn is_detached(&self) -> Result<bool, GitError> {
        Ok(GitCli::current_branch(&self.root).await?.is_none())
    }

    async fn active_branch(&self) -> Result<Option<String>, GitError> {
        GitCli::current_branch(&self.root).await
    }

    async fn head_short_id(&self) -> Result<String, GitError> {
        GitCli::short_head(&self.root).await
    }

    async fn branch_exists(&self, name: &str) -> Result<bool, GitError> {
        GitCli::branch_exists(&self.root, name).await
    }

    async fn create_branch(&self, name: &str) -> Result<(), GitError> {
        GitCli::create_branch(&self.root, name).await
    }

    async fn checkout(&self, name: &str) -> Result<(), GitError> {
        GitCli::checkout(&self.root, name).await
    }

    async fn ensure_remote(&self, remote: &str) -> Result<(), GitError> {
        GitCli::get_remote_url(&self.root, remote).await.map(|_| ())
    }

    async fn push(
        &self,
        remote: &str,
        refspec: &str,
        set_upstream: bool,
    ) -> Result<PushOutcome, GitError> {
        let output = GitCli::push(&self.root, remote, refspec, set_upstream).await?;

        let rejected = rejected_refs(&output.stdout);
        if !rejected.is_empty() {
            return Ok(PushOutcome::Rejected {
                reason: rejected.join("; "),
            });
        }

        if !output.success {
            return Err(GitError::command_failed("push", output.stderr));
        }

        Ok(PushOutcome::Pushed)
    }
}

/// Opens the repository containing a fixed starting directory
#[derive(Debug, Clone)]
pub struct GitRepositoryOpener {
    start: PathBuf,
}

impl GitRepositoryOpener {
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
        }
    }

    /// Start discovery from the process working directory
    pub fn from_cwd() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }
}

#[async_trait]
impl RepositoryOpener for GitRepositoryOpener {
    async fn open(&self) -> Result<Box<dyn Repository>, GitError> {
        let repo = GitRepository::discover(&self.start).await?;
        Ok(Box::new(repo))
    }
}
