//! Layered configuration for autofix.
//!
//! Settings come from `.autofix.toml` in the working tree, then from the
//! environment and command line (which clap merges before we see them).
//!
//! # Configuration File Format
//!
//! ```toml
//! [repository]
//! trunk = "main"
//! remote = "origin"
//! declarations_file = ".env.example"
//! assignee = "octocat"
//!
//! [run]
//! max_fixes = 3
//! excluded_labels = ["in progress", "wontfix"]
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::AutofixError;
use crate::git::remote_url;
use crate::github::{is_valid_github_token, parse_owner_repo_from_url};

pub const CONFIG_FILE_NAME: &str = ".autofix.toml";

/// Where fixes branch from and what they touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default = "default_trunk")]
    pub trunk: String,
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Environment-variable declarations, relative to the working tree
    #[serde(default = "default_declarations_file")]
    pub declarations_file: PathBuf,
    /// GitHub login assigned to every pull request
    #[serde(default)]
    pub assignee: Option<String>,
}

fn default_trunk() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_declarations_file() -> PathBuf {
    PathBuf::from(".env.example")
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            trunk: default_trunk(),
            remote: default_remote(),
            declarations_file: default_declarations_file(),
            assignee: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_max_fixes")]
    pub max_fixes: usize,
    /// Issues carrying any of these labels (case-insensitive) are skipped
    #[serde(default = "default_excluded_labels")]
    pub excluded_labels: Vec<String>,
}

fn default_max_fixes() -> usize {
    3
}

fn default_excluded_labels() -> Vec<String> {
    vec!["in progress".to_string(), "wontfix".to_string()]
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_fixes: default_max_fixes(),
            excluded_labels: default_excluded_labels(),
        }
    }
}

/// Contents of `.autofix.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutofixToml {
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub run: RunConfig,
}

impl AutofixToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| AutofixError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::parse(&content).map_err(|err| {
            AutofixError::Config {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
            .into()
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `.autofix.toml` from `workdir`, or defaults if there is none.
    pub fn load_or_default(workdir: &Path) -> Result<Self> {
        let path = workdir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub workdir: PathBuf,
    pub token: Option<String>,
    pub repo: Option<String>,
    pub max_fixes: Option<usize>,
    pub dry_run: Option<String>,
    pub output_file: Option<PathBuf>,
    /// REST API root, for GitHub Enterprise
    pub api_url: Option<String>,
}

/// Boolean-like flag values: `true`, `1`, `yes`, `on` (any case).
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutofixConfig {
    pub workdir: PathBuf,
    pub trunk: String,
    pub remote: String,
    pub declarations_file: PathBuf,
    pub assignee: Option<String>,
    pub excluded_labels: Vec<String>,
    pub max_fixes: usize,
    pub dry_run: bool,
    /// Automation output file (`GITHUB_OUTPUT`)
    pub output_file: Option<PathBuf>,
}

impl AutofixConfig {
    /// Read `.autofix.toml` from the working tree and apply `overrides`.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let file = AutofixToml::load_or_default(&overrides.workdir)?;
        Ok(Self::from_layers(file, overrides))
    }

    pub fn from_layers(file: AutofixToml, overrides: &ConfigOverrides) -> Self {
        Self {
            workdir: overrides.workdir.clone(),
            trunk: file.repository.trunk,
            remote: file.repository.remote,
            declarations_file: file.repository.declarations_file,
            assignee: file.repository.assignee.filter(|a| !a.is_empty()),
            excluded_labels: file.run.excluded_labels,
            max_fixes: overrides.max_fixes.unwrap_or(file.run.max_fixes),
            dry_run: overrides.dry_run.as_deref().is_some_and(parse_flag),
            output_file: overrides
                .output_file
                .clone()
                .filter(|p| !p.as_os_str().is_empty()),
        }
    }
}

/// What the tracker client needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubSettings {
    pub token: String,
    /// `owner/name`
    pub repo: String,
    pub api_url: Option<String>,
}

impl GitHubSettings {
    /// Token from the overrides; repository from the overrides or else the
    /// configured remote's URL.
    pub fn resolve(config: &AutofixConfig, overrides: &ConfigOverrides) -> Result<Self> {
        let token = overrides
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or(AutofixError::MissingToken)?;
        if !is_valid_github_token(&token) {
            tracing::warn!("GITHUB_TOKEN does not look like a GitHub token; using it anyway");
        }

        let repo = overrides
            .repo
            .clone()
            .filter(|r| !r.trim().is_empty())
            .or_else(|| {
                remote_url(&config.workdir, &config.remote)
                    .and_then(|url| parse_owner_repo_from_url(&url))
            })
            .ok_or(AutofixError::MissingRepository)?;

        let api_url = overrides
            .api_url
            .clone()
            .filter(|url| !url.trim().is_empty());

        Ok(Self {
            token,
            repo,
            api_url,
        })
    }
}
