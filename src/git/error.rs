use thiserror::Error;

/// Errors from git operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitError {
    #[error("not a git repository (or any of the parent directories)")]
    NotARepository,

    #[error("git {command}: {message}")]
    CommandFailed { command: String, message: String },

    #[error("remote '{0}' does not exist")]
    RemoteNotFound(String),

    #[error("could not run git: {0}")]
    Spawn(String),
}

impl GitError {
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        GitError::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = GitError::command_failed("push", "rejected");
        assert_eq!(err.to_string(), "git push: rejected");

        let err = GitError::RemoteNotFound("origin".to_string());
        assert_eq!(err.to_string(), "remote 'origin' does not exist");
    }
}
