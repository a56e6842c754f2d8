//! `gibr alias`: global git aliases that route through `gibr git ...`.

use anyhow::Result;
use async_trait::async_trait;

use super::Context;
use crate::error::Aborted;
use crate::git::{GitCli, GitError};

/// Alias name and the command it expands to
pub const ALIASES: &[(&str, &str)] = &[
    ("create", "!gibr git create"),
    ("issues", "!gibr git issues"),
];

/// Read/write access to git configuration
#[async_trait]
pub trait GitConfigStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, GitError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), GitError>;
}

/// The user's `~/.gitconfig`
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalGitConfig;

#[async_trait]
impl GitConfigStore for GlobalGitConfig {
    async fn get(&self, key: &str) -> Result<Option<String>, GitError> {
        GitCli::get_global_config(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), GitError> {
        GitCli::set_global_config(key, value).await
    }
}

pub async fn run(ctx: &Context<'_>, store: &dyn GitConfigStore) -> Result<()> {
    let mut installed = 0;

    for (name, command) in ALIASES {
        let key = format!("alias.{}", name);
        let existing = store.get(&key).await.map_err(|e| git_failure(ctx, e))?;

        match existing.as_deref() {
            Some(current) if current == *command => {
                ctx.notifier
                    .info(&format!("Git alias 'git {}' already set.", name));
                continue;
            }
            Some(current) => {
                ctx.notifier.warning(&format!(
                    "Git alias 'git {}' is already set to '{}'.",
                    name, current
                ));
                if !ctx.prompter.confirm("Overwrite it?", false)? {
                    ctx.notifier.info(&format!("Skipped 'git {}'.", name));
                    continue;
                }
            }
            None => {}
        }

        store
            .set(&key, command)
            .await
            .map_err(|e| git_failure(ctx, e))?;
        ctx.notifier
            .success(&format!("Added git alias: git {} → gibr {}", name, name));
        installed += 1;
    }

    if installed > 0 {
        ctx.notifier
            .party("Git aliases ready. Try `git create <issue>` or `git issues`.");
    }
    Ok(())
}

fn git_failure(ctx: &Context<'_>, err: GitError) -> anyhow::Error {
    ctx.notifier.error(&format!("Git command failed: {}", err));
    Aborted.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::notify::{Level, RecordingNotifier};
    use crate::prompt::{Answer, ScriptedPrompter};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        values: Mutex<BTreeMap<String, String>>,
        fail: bool,
    }

    impl MemoryStore {
        fn with(key: &str, value: &str) -> Self {
            let store = Self::default();
            store
                .values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            store
        }

        fn value(&self, key: &str) -> Option<String> {
            self.values.lock().unwrap().get(key).cloned()
        }
    }

    #[async_trait]
    impl GitConfigStore for MemoryStore {
        async fn get(&self, key: &str) -> Result<Option<String>, GitError> {
            if self.fail {
                return Err(GitError::command_failed("config", "could not lock config file"));
            }
            Ok(self.value(key))
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), GitError> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    async fn run_with(store: &MemoryStore, answers: Vec<Answer>) -> (RecordingNotifier, Result<()>) {
        let config = Config::default();
        let notifier = RecordingNotifier::new();
        let prompter = ScriptedPrompter::new(answers);
        let ctx = Context {
            config: &config,
            notifier: &notifier,
            prompter: &prompter,
        };
        let result = run(&ctx, store).await;
        (notifier, result)
    }

    #[tokio::test]
    async fn test_installs_missing_aliases() {
        let store = MemoryStore::default();
        let (notifier, result) = run_with(&store, vec![]).await;

        result.unwrap();
        assert_eq!(store.value("alias.create").as_deref(), Some("!gibr git create"));
        assert_eq!(store.value("alias.issues").as_deref(), Some("!gibr git issues"));
        assert_eq!(notifier.count(Level::Success), 2);
        assert_eq!(notifier.count(Level::Party), 1);
    }

    #[tokio::test]
    async fn test_existing_alias_is_left_alone() {
        let store = MemoryStore::with("alias.create", "!gibr git create");
        let (notifier, result) = run_with(&store, vec![]).await;

        result.unwrap();
        assert_eq!(
            notifier.at(Level::Info),
            vec!["Git alias 'git create' already set."]
        );
        assert_eq!(notifier.count(Level::Success), 1);
    }

    #[tokio::test]
    async fn test_conflicting_alias_declined() {
        let store = MemoryStore::with("alias.create", "!other-tool");
        let (notifier, result) = run_with(&store, vec![Answer::Confirm(false)]).await;

        result.unwrap();
        assert_eq!(store.value("alias.create").as_deref(), Some("!other-tool"));
        assert_eq!(
            notifier.at(Level::Warning),
            vec!["Git alias 'git create' is already set to '!other-tool'."]
        );
        assert_eq!(notifier.at(Level::Info), vec!["Skipped 'git create'."]);
    }

    #[tokio::test]
    async fn test_conflicting_alias_overwritten() {
        let store = MemoryStore::with("alias.create", "!other-tool");
        let (_, result) = run_with(&store, vec![Answer::Confirm(true)]).await;

        result.unwrap();
        assert_eq!(store.value("alias.create").as_deref(), Some("!gibr git create"));
    }

    #[tokio::test]
    async fn test_git_failure_aborts() {
        let store = MemoryStore {
            fail: true,
            ..Default::default()
        };
        let (notifier, result) = run_with(&store, vec![]).await;

        assert!(result.unwrap_err().is::<Aborted>());
        assert_eq!(notifier.count(Level::Error), 1);
    }
}
