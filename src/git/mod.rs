//! Git operations module - repository handle and CLI wrapper.
//!
//! The branch workflow talks to a [`Repository`] handle. The production
//! handle ([`GitRepository`]) shells out to the git CLI; [`MockRepository`]
//! simulates repository state in memory for tests.

mod cli;
mod error;
mod mock;
mod repository;

pub use cli::{GitCli, GitOutput};
pub use error::GitError;
pub use mock::{MockRepository, MockRepositoryOpener, RepoCall};
pub use repository::{
    GitRepository, GitRepositoryOpener, PushOutcome, Repository, RepositoryOpener,
};
