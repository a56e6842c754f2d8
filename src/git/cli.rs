//! Git CLI wrapper for branch operations.
//!
//! Uses the git CLI directly (rather than libgit2) so hooks, credential
//! helpers and the user's git configuration apply exactly as they would
//! on the command line.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::GitError;

/// Captured result of a git invocation
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Low-level git command wrapper
pub struct GitCli;

impl GitCli {
    /// Execute a git command and capture its output, whatever the exit status
    async fn run(args: &[&str], cwd: &Path) -> Result<GitOutput, GitError> {
        debug!(?args, ?cwd, "Running git command");

        let output = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| GitError::Spawn(e.to_string()))?;

        Ok(GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    /// Execute a git command and return stdout, failing on a non-zero exit
    async fn run_git(args: &[&str], cwd: &Path) -> Result<String, GitError> {
        let output = Self::run(args, cwd).await?;

        if !output.success {
            return Err(GitError::command_failed(
                args.first().copied().unwrap_or_default(),
                output.stderr,
            ));
        }

        Ok(output.stdout)
    }

    /// Execute a git command, returning Ok(()) on success
    async fn run_git_silent(args: &[&str], cwd: &Path) -> Result<(), GitError> {
        Self::run_git(args, cwd).await?;
        Ok(())
    }

    /// Execute a git command that answers a yes/no question via its exit status
    async fn succeeds(args: &[&str], cwd: &Path) -> Result<bool, GitError> {
        Ok(Self::run(args, cwd).await?.success)
    }

    /// Get the root of the git repository containing `path`
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn repo_root(path: &Path) -> Result<PathBuf, GitError> {
        let output = Self::run(&["rev-parse", "--show-toplevel"], path).await?;
        if !output.success || output.stdout.is_empty() {
            return Err(GitError::NotARepository);
        }
        Ok(PathBuf::from(output.stdout))
    }

    /// Get the current branch name, or `None` when HEAD is detached
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn current_branch(path: &Path) -> Result<Option<String>, GitError> {
        let output = Self::run(&["symbolic-ref", "--quiet", "--short", "HEAD"], path).await?;
        if output.success {
            return Ok(Some(output.stdout));
        }
        // Exit status 1 with no message means HEAD is not a symbolic ref
        if output.stderr.is_empty() {
            Ok(None)
        } else {
            Err(GitError::command_failed("symbolic-ref", output.stderr))
        }
    }

    /// Check if tracked files have uncommitted changes (untracked files are ignored)
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn is_dirty(path: &Path) -> Result<bool, GitError> {
        let output = Self::run_git(&["status", "--porcelain", "--untracked-files=no"], path).await?;
        Ok(!output.is_empty())
    }

    /// Check if HEAD resolves to a commit (false in a freshly initialized repository)
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn has_commits(path: &Path) -> Result<bool, GitError> {
        Self::succeeds(&["rev-parse", "--verify", "--quiet", "HEAD^{commit}"], path).await
    }

    /// Get the abbreviated HEAD commit SHA
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn short_head(path: &Path) -> Result<String, GitError> {
        Self::run_git(&["rev-parse", "--short", "HEAD"], path).await
    }

    /// Check if a local branch exists
    #[instrument(skip_all, fields(path = %path.display(), branch))]
    pub async fn branch_exists(path: &Path, branch: &str) -> Result<bool, GitError> {
        let refname = format!("refs/heads/{}", branch);
        Self::succeeds(&["show-ref", "--verify", "--quiet", &refname], path).await
    }

    /// Create a new branch at HEAD
    #[instrument(skip_all, fields(path = %path.display(), branch))]
    pub async fn create_branch(path: &Path, branch: &str) -> Result<(), GitError> {
        Self::run_git_silent(&["branch", branch], path).await
    }

    /// Switch the working tree to an existing branch
    #[instrument(skip_all, fields(path = %path.display(), branch))]
    pub async fn checkout(path: &Path, branch: &str) -> Result<(), GitError> {
        Self::run_git_silent(&["checkout", branch, "--"], path).await
    }

    /// Get the URL of a remote
    #[instrument(skip_all, fields(path = %path.display(), remote))]
    pub async fn get_remote_url(path: &Path, remote: &str) -> Result<String, GitError> {
        let output = Self::run(&["remote", "get-url", remote], path).await?;
        if !output.success {
            return Err(GitError::RemoteNotFound(remote.to_string()));
        }
        Ok(output.stdout)
    }

    /// Push a refspec to a remote.
    ///
    /// Runs with `--porcelain` and returns the captured output even when git
    /// exits non-zero, so callers can tell rejected refs apart from
    /// transport failures.
    #[instrument(skip_all, fields(path = %path.display(), remote, refspec, set_upstream))]
    pub async fn push(
        path: &Path,
        remote: &str,
        refspec: &str,
        set_upstream: bool,
    ) -> Result<GitOutput, GitError> {
        if set_upstream {
            Self::run(&["push", "--porcelain", "-u", remote, refspec], path).await
        } else {
            Self::run(&["push", "--porcelain", remote, refspec], path).await
        }
    }

    /// Read a global config value, `None` when unset
    #[instrument(skip_all, fields(key))]
    pub async fn get_global_config(key: &str) -> Result<Option<String>, GitError> {
        let cwd = std::env::current_dir().map_err(|e| GitError::Spawn(e.to_string()))?;
        let output = Self::run(&["config", "--global", "--get", key], &cwd).await?;
        Ok(output.success.then_some(output.stdout))
    }

    /// Set a global config value
    #[instrument(skip_all, fields(key))]
    pub async fn set_global_config(key: &str, value: &str) -> Result<(), GitError> {
        let cwd = std::env::current_dir().map_err(|e| GitError::Spawn(e.to_string()))?;
        Self::run_git_silent(&["config", "--global", key, value], &cwd).await
    }
}

/// Find rejected refs in `git push --porcelain` output.
///
/// Porcelain lines have the form `<flag>\t<from>:<to>\t<summary>`; a `!`
/// flag marks a ref the remote refused.
pub(crate) fn rejected_refs(porcelain: &str) -> Vec<String> {
    porcelain
        .lines()
        .filter_map(|line| line.strip_prefix("!\t"))
        .map(|rest| rest.replace('\t', " "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rejected_refs_parses_porcelain() {
        let output = "To ../origin.git\n\
                      =\trefs/heads/main:refs/heads/main\t[up to date]\n\
                      !\trefs/heads/feat:refs/heads/feat\t[rejected] (non-fast-forward)\n\
                      Done";
        assert_eq!(
            rejected_refs(output),
            vec!["refs/heads/feat:refs/heads/feat [rejected] (non-fast-forward)"]
        );
    }

    #[test]
    fn test_rejected_refs_none_on_success() {
        let output = "To ../origin.git\n*\trefs/heads/feat:refs/heads/feat\t[new branch]\nDone";
        assert!(rejected_refs(output).is_empty());
    }

    #[tokio::test]
    async fn test_repo_root_outside_repo() {
        let temp = TempDir::new().unwrap();
        let result = GitCli::repo_root(temp.path()).await;
        // Without git installed this is a spawn error; either way it is not Ok
        assert!(result.is_err());
    }
}
