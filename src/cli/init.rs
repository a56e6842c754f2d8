//! `gibr init`: interactive setup writing a `.gibrconfig`.

use anyhow::Result;
use std::path::Path;
use tracing::debug;

use super::Context;
use crate::config::{Config, LOCAL_CONFIG_FILE};
use crate::trackers::TrackerKind;

pub async fn run(ctx: &Context<'_>, dir: &Path) -> Result<()> {
    let path = dir.join(LOCAL_CONFIG_FILE);
    let prompter = ctx.prompter;

    if path.exists()
        && !prompter.confirm(
            &format!("{} already exists here. Overwrite it?", LOCAL_CONFIG_FILE),
            false,
        )?
    {
        ctx.notifier.info("Operation canceled by user.");
        return Ok(());
    }

    // Prompt defaults come from the effective config; only the answers and
    // what the local file already held are written back
    let effective = ctx.config;
    let mut config = if path.exists() {
        Config::load_file(&path).unwrap_or_else(|err| {
            debug!(error = %err, "Existing local config unreadable, starting from defaults");
            Config::default()
        })
    } else {
        Config::default()
    };

    let kinds = TrackerKind::all();
    let names: Vec<&str> = kinds.iter().map(TrackerKind::display_name).collect();
    let current = effective
        .issue_tracker
        .name
        .and_then(|k| kinds.iter().position(|c| *c == k))
        .unwrap_or(0);
    let kind = kinds[prompter.select("Issue tracker", &names, current)?];
    config.issue_tracker.name = Some(kind);

    let token_env = match kind {
        TrackerKind::Github => {
            let repo = prompter.input(
                "GitHub repository (owner/name)",
                effective.github.repo.as_deref().unwrap_or_default(),
            )?;
            config.github.repo = non_empty(repo);
            effective.github.token_env.clone()
        }
        TrackerKind::Gitlab => {
            config.gitlab.url = prompter.input("GitLab URL", &effective.gitlab.url)?;
            let project = prompter.input(
                "GitLab project (group/name or id)",
                effective.gitlab.project.as_deref().unwrap_or_default(),
            )?;
            config.gitlab.project = non_empty(project);
            effective.gitlab.token_env.clone()
        }
        TrackerKind::Jira => {
            let url = prompter.input(
                "Jira URL (https://your-domain.atlassian.net)",
                effective.jira.url.as_deref().unwrap_or_default(),
            )?;
            config.jira.url = non_empty(url);
            let user = prompter.input(
                "Jira account email",
                effective.jira.user.as_deref().unwrap_or_default(),
            )?;
            config.jira.user = non_empty(user);
            let key = prompter.input(
                "Default project key (optional)",
                effective.jira.project_key.as_deref().unwrap_or_default(),
            )?;
            config.jira.project_key = non_empty(key);
            effective.jira.token_env.clone()
        }
        TrackerKind::Linear => {
            let team = prompter.input(
                "Default team key (optional)",
                effective.linear.team.as_deref().unwrap_or_default(),
            )?;
            config.linear.team = non_empty(team);
            effective.linear.api_key_env.clone()
        }
    };

    config.default.branch_name_format =
        prompter.input("Branch name format", &effective.default.branch_name_format)?;
    config.default.push =
        prompter.confirm("Push new branches to origin?", effective.default.push)?;

    Config::save(&config, &path)?;

    ctx.notifier
        .success(&format!("Wrote {}", path.display()));
    if std::env::var(&token_env).map_or(true, |v| v.is_empty()) {
        ctx.notifier.info(&format!(
            "Set {} in your environment so gibr can reach {}.",
            token_env,
            kind.display_name()
        ));
    }
    ctx.notifier
        .party("gibr is ready. Try `gibr issues`.");
    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
