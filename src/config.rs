use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::trackers::TrackerKind;

/// Name of the per-project config file, looked up from the working directory upwards
pub const LOCAL_CONFIG_FILE: &str = ".gibrconfig";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub default: DefaultConfig,
    #[serde(default)]
    pub issue_tracker: IssueTrackerConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub gitlab: GitlabConfig,
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub linear: LinearConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Branch naming and push behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultConfig {
    /// Template with `{issue}`, `{title}`, `{type}` and `{assignee}` placeholders
    #[serde(default = "default_branch_name_format")]
    pub branch_name_format: String,
    /// Push new branches to `origin`
    #[serde(default)]
    pub push: bool,
}

fn default_branch_name_format() -> String {
    "{issue}-{title}".to_string()
}

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            branch_name_format: default_branch_name_format(),
            push: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueTrackerConfig {
    /// github, gitlab, jira or linear
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<TrackerKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Repository as `owner/name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Environment variable holding the API token
    #[serde(default = "default_github_token_env")]
    pub token_env: String,
    #[serde(default = "default_github_url")]
    pub url: String,
}

fn default_github_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            repo: None,
            token_env: default_github_token_env(),
            url: default_github_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitlabConfig {
    #[serde(default = "default_gitlab_url")]
    pub url: String,
    /// Project path (`group/project`) or numeric id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default = "default_gitlab_token_env")]
    pub token_env: String,
}

fn default_gitlab_url() -> String {
    "https://gitlab.com".to_string()
}

fn default_gitlab_token_env() -> String {
    "GITLAB_TOKEN".to_string()
}

impl Default for GitlabConfig {
    fn default() -> Self {
        Self {
            url: default_gitlab_url(),
            project: None,
            token_env: default_gitlab_token_env(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraConfig {
    /// Site URL, e.g. `https://your-domain.atlassian.net`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Account email used for Basic auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Prepended to bare issue numbers (`123` becomes `PROJ-123`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_key: Option<String>,
    #[serde(default = "default_jira_token_env")]
    pub token_env: String,
}

fn default_jira_token_env() -> String {
    "JIRA_TOKEN".to_string()
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: None,
            project_key: None,
            token_env: default_jira_token_env(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConfig {
    /// Team key prepended to bare issue numbers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default = "default_linear_api_key_env")]
    pub api_key_env: String,
}

fn default_linear_api_key_env() -> String {
    "LINEAR_API_KEY".to_string()
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            team: None,
            api_key_env: default_linear_api_key_env(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// User-wide config in ~/.config/gibr/
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gibr").join("config.toml"))
    }

    /// Nearest `.gibrconfig` in `start` or one of its ancestors
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Load configuration for a command run from `cwd`
    pub fn load(cwd: &Path) -> Result<Self> {
        Self::load_from(Self::user_config_path().as_deref(), cwd)
    }

    /// Load configuration with an explicit user config location.
    ///
    /// Later layers override earlier ones: embedded defaults, the user
    /// config, the nearest `.gibrconfig`, then `GIBR__SECTION__KEY`
    /// environment variables.
    pub fn load_from(user_config: Option<&Path>, cwd: &Path) -> Result<Self> {
        let mut builder = Self::defaults_builder()?;

        if let Some(path) = user_config.filter(|p| p.is_file()) {
            builder = builder.add_source(
                config::File::new(&path.to_string_lossy(), config::FileFormat::Toml),
            );
        }

        if let Some(path) = Self::find_local_config(cwd) {
            tracing::debug!(path = %path.display(), "Using local config");
            builder = builder.add_source(
                config::File::new(&path.to_string_lossy(), config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("GIBR")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Load a single config file on top of the defaults, ignoring the user
    /// config and the environment
    pub fn load_file(path: &Path) -> Result<Self> {
        let config = Self::defaults_builder()?
            .add_source(config::File::new(
                &path.to_string_lossy(),
                config::FileFormat::Toml,
            ))
            .build()
            .with_context(|| format!("Failed to load {}", path.display()))?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    fn defaults_builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults_json = serde_json::to_string(&Config::default())
            .context("Failed to serialize default config")?;
        Ok(config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        )))
    }

    /// Write this config as TOML to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(path, toml_str)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }
}
