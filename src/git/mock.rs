//! In-memory repository for exercising the branch workflow without git.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{GitError, PushOutcome, Repository, RepositoryOpener};

/// A recorded mutating call against a [`MockRepository`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoCall {
    CreateBranch(String),
    Checkout(String),
    Push {
        remote: String,
        refspec: String,
        set_upstream: bool,
    },
}

#[derive(Debug, Clone)]
struct MockState {
    dirty: bool,
    head_valid: bool,
    detached: bool,
    active_branch: String,
    head_id: String,
    branches: BTreeSet<String>,
    remotes: BTreeSet<String>,
    create_error: Option<GitError>,
    checkout_error: Option<GitError>,
    push_error: Option<GitError>,
    push_outcome: PushOutcome,
}

/// Simulated working copy.
///
/// Clones share state, the call log and the release counter, so a test can
/// keep one clone for assertions while the workflow owns another.
#[derive(Debug, Clone)]
pub struct MockRepository {
    state: Arc<Mutex<MockState>>,
    calls: Arc<Mutex<Vec<RepoCall>>>,
    released: Arc<AtomicUsize>,
    is_handle: bool,
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRepository {
    /// A clean repository on `main` with one commit and an `origin` remote
    pub fn new() -> Self {
        let mut branches = BTreeSet::new();
        branches.insert("main".to_string());
        let mut remotes = BTreeSet::new();
        remotes.insert("origin".to_string());

        Self {
            state: Arc::new(Mutex::new(MockState {
                dirty: false,
                head_valid: true,
                detached: false,
                active_branch: "main".to_string(),
                head_id: "abc1234".to_string(),
                branches,
                remotes,
                create_error: None,
                checkout_error: None,
                push_error: None,
                push_outcome: PushOutcome::Pushed,
            })),
            calls: Arc::new(Mutex::new(Vec::new())),
            released: Arc::new(AtomicUsize::new(0)),
            is_handle: false,
        }
    }

    fn update(self, f: impl FnOnce(&mut MockState)) -> Self {
        f(&mut *self.state.lock().unwrap());
        self
    }

    pub fn dirty(self, dirty: bool) -> Self {
        self.update(|s| s.dirty = dirty)
    }

    /// Simulate a repository without any commits
    pub fn without_commits(self) -> Self {
        self.update(|s| s.head_valid = false)
    }

    pub fn detached(self, detached: bool) -> Self {
        self.update(|s| s.detached = detached)
    }

    /// Check out `name`, creating it if needed
    pub fn on_branch(self, name: &str) -> Self {
        self.update(|s| {
            s.branches.insert(name.to_string());
            s.active_branch = name.to_string();
        })
    }

    pub fn with_branch(self, name: &str) -> Self {
        self.update(|s| {
            s.branches.insert(name.to_string());
        })
    }

    pub fn without_remote(self, name: &str) -> Self {
        self.update(|s| {
            s.remotes.remove(name);
        })
    }

    pub fn fail_create(self, error: GitError) -> Self {
        self.update(|s| s.create_error = Some(error))
    }

    pub fn fail_checkout(self, error: GitError) -> Self {
        self.update(|s| s.checkout_error = Some(error))
    }

    pub fn fail_push(self, error: GitError) -> Self {
        self.update(|s| s.push_error = Some(error))
    }

    pub fn push_outcome(self, outcome: PushOutcome) -> Self {
        self.update(|s| s.push_outcome = outcome)
    }

    /// Mutating calls made so far, in order
    pub fn calls(&self) -> Vec<RepoCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of handles that have been released (dropped)
    pub fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn branches(&self) -> Vec<String> {
        self.state.lock().unwrap().branches.iter().cloned().collect()
    }

    pub fn current_branch(&self) -> String {
        self.state.lock().unwrap().active_branch.clone()
    }

    /// A clone handed out as a workflow-owned handle; only these count releases
    fn handle(&self) -> Self {
        let mut handle = self.clone();
        handle.is_handle = true;
        handle
    }

    fn record(&self, call: RepoCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Drop for MockRepository {
    fn drop(&mut self) {
        if self.is_handle {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Repository for MockRepository {
    async fn is_dirty(&self) -> Result<bool, GitError> {
        Ok(self.state.lock().unwrap().dirty)
    }

    async fn head_is_valid(&self) -> Result<bool, GitError> {
        Ok(self.state.lock().unwrap().head_valid)
    }

    async fn is_detached(&self) -> Result<bool, GitError> {
        Ok(self.state.lock().unwrap().detached)
    }

    async fn active_branch(&self) -> Result<Option<String>, GitError> {
        let state = self.state.lock().unwrap();
        if state.detached {
            Ok(None)
        } else {
            Ok(Some(state.active_branch.clone()))
        }
    }

    async fn head_short_id(&self) -> Result<String, GitError> {
        Ok(self.state.lock().unwrap().head_id.clone())
    }

    async fn branch_exists(&self, name: &str) -> Result<bool, GitError> {
        Ok(self.state.lock().unwrap().branches.contains(name))
    }

    async fn create_branch(&self, name: &str) -> Result<(), GitError> {
        self.record(RepoCall::CreateBranch(name.to_string()));
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.create_error.clone() {
            return Err(err);
        }
        if !state.branches.insert(name.to_string()) {
            return Err(GitError::command_failed(
                "branch",
                format!("fatal: a branch named '{}' already exists", name),
            ));
        }
        Ok(())
    }

    async fn checkout(&self, name: &str) -> Result<(), GitError> {
        self.record(RepoCall::Checkout(name.to_string()));
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.checkout_error.clone() {
            return Err(err);
        }
        state.active_branch = name.to_string();
        state.detached = false;
        Ok(())
    }

    async fn ensure_remote(&self, remote: &str) -> Result<(), GitError> {
        if self.state.lock().unwrap().remotes.contains(remote) {
            Ok(())
        } else {
            Err(GitError::RemoteNotFound(remote.to_string()))
        }
    }

    async fn push(
        &self,
        remote: &str,
        refspec: &str,
        set_upstream: bool,
    ) -> Result<PushOutcome, GitError> {
        self.record(RepoCall::Push {
            remote: remote.to_string(),
            refspec: refspec.to_string(),
            set_upstream,
        });
        let state = self.state.lock().unwrap();
        if let Some(err) = state.push_error.clone() {
            return Err(err);
        }
        Ok(state.push_outcome.clone())
    }
}

/// Hands out [`MockRepository`] handles, or reports "not a repository"
#[derive(Debug, Clone)]
pub struct MockRepositoryOpener {
    repo: Option<MockRepository>,
    opened: Arc<AtomicUsize>,
}

impl MockRepositoryOpener {
    pub fn new(repo: &MockRepository) -> Self {
        Self {
            repo: Some(repo.clone()),
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// An opener whose working directory is not inside any repository
    pub fn not_a_repository() -> Self {
        Self {
            repo: None,
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositoryOpener for MockRepositoryOpener {
    async fn open(&self) -> Result<Box<dyn Repository>, GitError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        match &self.repo {
            Some(repo) => Ok(Box::new(repo.handle())),
            None => Err(GitError::NotARepository),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_checkout_update_state() {
        let repo = MockRepository::new();
        repo.create_branch("feature").await.unwrap();
        repo.checkout("feature").await.unwrap();

        assert_eq!(repo.current_branch(), "feature");
        assert_eq!(repo.branches(), vec!["feature", "main"]);
        assert_eq!(
            repo.calls(),
            vec![
                RepoCall::CreateBranch("feature".to_string()),
                RepoCall::Checkout("feature".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_create_existing_branch_fails() {
        let repo = MockRepository::new();
        assert!(repo.create_branch("main").await.is_err());
    }

    #[tokio::test]
    async fn test_handles_count_release_once() {
        let repo = MockRepository::new();
        let opener = MockRepositoryOpener::new(&repo);

        let handle = opener.open().await.unwrap();
        assert_eq!(repo.release_count(), 0);
        drop(handle);
        assert_eq!(repo.release_count(), 1);
        assert_eq!(opener.open_count(), 1);
    }

    #[tokio::test]
    async fn test_not_a_repository_opener() {
        let opener = MockRepositoryOpener::not_a_repository();
        let result = opener.open().await;
        assert!(matches!(result, Err(GitError::NotARepository)));
    }
}
