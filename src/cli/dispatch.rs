//! Argument rewriting that runs before clap sees the command line.
//!
//! Two shortcuts are supported:
//!
//! - `gibr git <cmd> ...` is what the git aliases installed by `gibr alias`
//!   expand to; the leading `git` is dropped and global flags are moved in
//!   front of the subcommand.
//! - `gibr 123` and `gibr PROJ-123` mean `gibr create ...`.

use std::collections::BTreeSet;

use crate::trackers::{JiraTracker, LinearTracker};

/// Leading token that marks an invocation through a git alias
pub const GIT_ALIAS: &str = "git";

/// Flags accepted before any subcommand
pub const GLOBAL_FLAGS: &[&str] = &["--verbose"];

/// Subcommand inserted in front of a bare issue reference
pub const IMPLICIT_COMMAND: &str = "create";

/// Names clap will accept as a subcommand
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandRegistry {
    names: BTreeSet<String>,
}

impl CommandRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Every subcommand of `command`, its aliases, and the generated `help`
    pub fn from_command(command: &clap::Command) -> Self {
        let mut names: BTreeSet<String> = command
            .get_subcommands()
            .flat_map(|sub| {
                std::iter::once(sub.get_name().to_string())
                    .chain(sub.get_all_aliases().map(str::to_string))
            })
            .collect();
        names.insert("help".to_string());
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Recognizes a token as an issue reference
pub type IssueMatcher = fn(&str) -> bool;

/// Rewrites raw arguments (without the program name) into clap's grammar
#[derive(Debug, Clone)]
pub struct ArgumentDispatcher {
    registry: CommandRegistry,
    matchers: Vec<IssueMatcher>,
}

impl ArgumentDispatcher {
    /// Dispatcher recognizing Jira and Linear keys
    pub fn new(registry: CommandRegistry) -> Self {
        Self::with_matchers(
            registry,
            vec![JiraTracker::is_jira_issue, LinearTracker::is_linear_issue],
        )
    }

    pub fn with_matchers(registry: CommandRegistry, matchers: Vec<IssueMatcher>) -> Self {
        Self { registry, matchers }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Drop a leading `git` and move global flags to the front
    pub fn route_git_alias(&self, args: &[String]) -> Vec<String> {
        match args.split_first() {
            Some((first, rest)) if first == GIT_ALIAS => {
                let (flags, others): (Vec<String>, Vec<String>) = rest
                    .iter()
                    .cloned()
                    .partition(|arg| GLOBAL_FLAGS.contains(&arg.as_str()));
                flags.into_iter().chain(others).collect()
            }
            _ => args.to_vec(),
        }
    }

    /// Non-numeric issue reference (`ABC-123`, `eng-42`)
    pub fn is_likely_non_digit_issue(&self, arg: &str) -> bool {
        self.matchers.iter().any(|matches| matches(arg))
    }

    fn is_issue_reference(&self, arg: &str) -> bool {
        let numeric = !arg.is_empty() && arg.bytes().all(|b| b.is_ascii_digit());
        numeric || self.is_likely_non_digit_issue(arg)
    }

    /// Insert `create` before the first positional token if it names an issue
    pub fn insert_implicit_create(&self, args: &[String]) -> Vec<String> {
        let mut out = args.to_vec();
        if let Some(index) = args.iter().position(|arg| !arg.starts_with("--")) {
            let arg = &args[index];
            if !self.registry.contains(arg) && self.is_issue_reference(arg) {
                out.insert(index, IMPLICIT_COMMAND.to_string());
            }
        }
        out
    }

    /// Both passes, in order
    pub fn normalize(&self, args: &[String]) -> Vec<String> {
        let routed = self.route_git_alias(args);
        self.insert_implicit_create(&routed)
    }
}
