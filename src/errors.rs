//! Typed error hierarchy for issue-autofix.
//!
//! Most plumbing returns `anyhow::Result`; the variants here are the failures
//! callers need to tell apart (the fatal configuration errors in `main`, a
//! failed external command inside a strategy).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutofixError {
    #[error("GITHUB_TOKEN not set")]
    MissingToken,

    #[error(
        "No repository configured: set REPO_NAME or GITHUB_REPOSITORY, or add an 'origin' GitHub remote"
    )]
    MissingRepository,

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` exited with {}: {stderr}", exit_label(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("GitHub API error: {0}")]
    GitHub(String),

    #[error("Failed to access declarations file {path}: {source}")]
    Declarations {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Git status error: {0}")]
    Git(#[from] git2::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "signal".to_string(),
    }
}
