use anyhow::{Context as _, Result};
use std::io::IsTerminal;
use std::process::ExitCode;

use gibr::cli::alias::GlobalGitConfig;
use gibr::cli::issues::OutputMode;
use gibr::cli::{alias, create, init, issues, Cli, Commands, Context};
use gibr::config::Config;
use gibr::error::Aborted;
use gibr::git::GitRepositoryOpener;
use gibr::logging;
use gibr::notify::ConsoleNotifier;
use gibr::prompt::TerminalPrompter;
use gibr::trackers;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::parse_args_os(std::env::args_os().skip(1)) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        // Already reported to the user
        Err(err) if err.is::<Aborted>() => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let config = Config::load(&cwd)?;
    logging::init_logging(cli.verbose, &config.logging);
    tracing::debug!(command = ?cli.command, "Starting");

    let notifier = ConsoleNotifier;
    let prompter = TerminalPrompter;
    let ctx = Context {
        config: &config,
        notifier: &notifier,
        prompter: &prompter,
    };

    match cli.command {
        Commands::Create { issue, dry_run } => {
            let tracker = trackers::from_config(&config)?;
            let opener = GitRepositoryOpener::new(&cwd);
            let outcome = create::run(
                &ctx,
                tracker.as_ref(),
                &opener,
                &issue,
                dry_run,
                &mut std::io::stdout().lock(),
            )
            .await?;
            tracing::debug!(?outcome, "Branch workflow finished");
        }
        Commands::Issues { json } => {
            let tracker = trackers::from_config(&config)?;
            let mode = if std::io::stdout().is_terminal() {
                OutputMode::Pager
            } else {
                OutputMode::Plain
            };
            issues::run(
                tracker.as_ref(),
                &notifier,
                json,
                mode,
                &mut std::io::stdout().lock(),
            )
            .await?;
        }
        Commands::Alias => alias::run(&ctx, &GlobalGitConfig).await?,
        Commands::Init => init::run(&ctx, &cwd).await?,
    }

    Ok(())
}
