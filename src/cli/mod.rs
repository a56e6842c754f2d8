//! Command line surface.

pub mod alias;
pub mod create;
pub mod dispatch;
pub mod init;
pub mod issues;

use clap::{CommandFactory, Parser, Subcommand};
use std::ffi::OsString;

pub use dispatch::{ArgumentDispatcher, CommandRegistry};

use crate::config::Config;
use crate::notify::Notifier;
use crate::prompt::Prompter;

#[derive(Debug, Parser)]
#[command(name = "gibr")]
#[command(about = "Create git branches from Jira, Linear, GitHub and GitLab issues")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create and check out a branch for an issue (default: `gibr 123`)
    Create {
        /// Issue number or key (e.g. 123, PROJ-123)
        issue: String,

        /// Show what would happen without touching the repository
        #[arg(long)]
        dry_run: bool,
    },

    /// List open issues assigned to you
    Issues {
        /// Print issues as JSON
        #[arg(long)]
        json: bool,
    },

    /// Install `git create` and `git issues` aliases
    Alias,

    /// Write a .gibrconfig for this repository
    Init,
}

impl Cli {
    /// Subcommand names known to the parser
    pub fn registry() -> CommandRegistry {
        CommandRegistry::from_command(&Cli::command())
    }

    /// Parse raw OS arguments (program name excluded). Arguments that are not
    /// valid UTF-8 are converted lossily rather than rejected.
    pub fn parse_args_os<I>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<String> = args
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        Self::parse_normalized(&args)
    }

    /// Rewrite `args` (program name excluded) and parse them
    pub fn parse_normalized(args: &[String]) -> Result<Self, clap::Error> {
        let dispatcher = ArgumentDispatcher::new(Self::registry());
        let normalized = dispatcher.normalize(args);
        Cli::try_parse_from(std::iter::once("gibr".to_string()).chain(normalized))
    }
}

/// What every command needs besides its own arguments
pub struct Context<'a> {
    pub config: &'a Config,
    pub notifier: &'a dyn Notifier,
    pub prompter: &'a dyn Prompter,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_registry_lists_subcommands() {
        let registry = Cli::registry();
        for name in ["create", "issues", "alias", "init", "help"] {
            assert!(registry.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_bare_number_parses_as_create() {
        let cli = Cli::parse_normalized(&args(&["123", "--dry-run"])).unwrap();
        match cli.command {
            Commands::Create { issue, dry_run } => {
                assert_eq!(issue, "123");
                assert!(dry_run);
            }
            other => panic!("expected create, got {:?}", other),
        }
    }

    #[test]
    fn test_git_alias_form_parses() {
        let cli = Cli::parse_normalized(&args(&["git", "issues", "--verbose", "--json"])).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Issues { json: true }));
    }

    #[test]
    fn test_verbose_before_issue_key() {
        let cli = Cli::parse_normalized(&args(&["--verbose", "PROJ-1"])).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Create { ref issue, dry_run: false } if issue == "PROJ-1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_argument_does_not_panic() {
        use std::os::unix::ffi::OsStringExt;

        let raw = vec![
            OsString::from("create"),
            OsString::from_vec(vec![b'4', 0xff, b'2']),
        ];
        let cli = Cli::parse_args_os(raw).unwrap();
        match cli.command {
            Commands::Create { issue, .. } => assert_eq!(issue, "4\u{fffd}2"),
            other => panic!("expected create, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_word_is_parse_error() {
        assert!(Cli::parse_normalized(&args(&["frobnicate"])).is_err());
    }
}
