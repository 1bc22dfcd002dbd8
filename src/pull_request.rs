//! Pull request creation through the `gh` CLI.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::runner::CommandRunner;

/// Strategy-supplied content of a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestDraft {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Everything needed to open a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub draft: PullRequestDraft,
    pub head: String,
    pub base: String,
    pub assignee: Option<String>,
    /// Issue closed by merging this request.
    pub closes: Option<u64>,
}

impl NewPullRequest {
    /// Body as submitted, with the closing reference appended.
    pub fn full_body(&self) -> String {
        match self.closes {
            Some(number) => format!("{}\n\nCloses #{}", self.draft.body, number),
            None => self.draft.body.clone(),
        }
    }
}

#[async_trait]
pub trait PullRequestCreator: Send + Sync {
    /// Open the request and return its identifier (usually the URL).
    async fn create(&self, request: &NewPullRequest) -> Result<String>;
}

/// Opens pull requests with `gh pr create` in the working tree.
pub struct GhCli {
    runner: Arc<dyn CommandRunner>,
    workdir: PathBuf,
}

impl GhCli {
    pub fn new(runner: Arc<dyn CommandRunner>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            workdir: workdir.into(),
        }
    }
}

/// argv for `gh`, in the order the CLI documents them.
pub fn gh_args(request: &NewPullRequest) -> Vec<String> {
    let mut args = vec![
        "pr".to_string(),
        "create".to_string(),
        "--title".to_string(),
        request.draft.title.clone(),
        "--body".to_string(),
        request.full_body(),
    ];
    if !request.draft.labels.is_empty() {
        args.push("--label".to_string());
        args.push(request.draft.labels.join(","));
    }
    if let Some(assignee) = &request.assignee {
        args.push("--assignee".to_string());
        args.push(assignee.clone());
    }
    args.extend([
        "--base".to_string(),
        request.base.clone(),
        "--head".to_string(),
        request.head.clone(),
    ]);
    args
}

#[async_trait]
impl PullRequestCreator for GhCli {
    async fn create(&self, request: &NewPullRequest) -> Result<String> {
        let args = gh_args(request);
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self
            .runner
            .run("gh", &argv, &self.workdir)
            .await?
            .check("gh", &["pr", "create", "--head", request.head.as_str()])?;
        Ok(output.stdout.trim().to_string())
    }
}
