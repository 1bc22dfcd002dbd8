//! Fix strategies and the shared branch → transform → pull request workflow.
//!
//! | Module           | Strategy                                              |
//! |------------------|-------------------------------------------------------|
//! | `documentation`  | doc-comment stubs above exported functions            |
//! | `error_handling` | TODO marker above route handlers without try/catch    |
//! | `env_vars`       | missing `process.env` names appended to declarations |
//! | `dependency`     | npm audit / npm-check-updates                         |
//! | `directive`      | `"use client"` for hook-using modules (generic)       |
//! | `maintenance`    | repository-wide env + directive pass                  |

pub mod dependency;
pub mod directive;
pub mod documentation;
pub mod env_vars;
pub mod error_handling;
pub mod maintenance;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::classifier::Category;
use crate::config::AutofixConfig;
use crate::discovery::SourceTree;
use crate::git::VersionControl;
use crate::github::Issue;
use crate::pull_request::{NewPullRequest, PullRequestCreator, PullRequestDraft};
use crate::runner::CommandRunner;

/// Prefix shared by every branch this tool creates.
pub const BRANCH_PREFIX: &str = "auto-fix";

/// Cap on candidate files per discovery step.
pub const DEFAULT_FILE_LIMIT: usize = 5;

/// What a workflow run is for.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Issue(&'a Issue),
    Maintenance,
}

impl Subject<'_> {
    pub fn number(&self) -> Option<u64> {
        match self {
            Subject::Issue(issue) => Some(issue.number),
            Subject::Maintenance => None,
        }
    }

    /// Issue title and body, empty for maintenance.
    pub fn text(&self) -> String {
        match self {
            Subject::Issue(issue) => issue.text(),
            Subject::Maintenance => String::new(),
        }
    }

    /// Issue number for branch names, or `maintenance`.
    pub fn tag(&self) -> String {
        match self.number() {
            Some(n) => n.to_string(),
            None => "maintenance".to_string(),
        }
    }

    /// `#N` for titles and messages, or `maintenance`.
    pub fn reference(&self) -> String {
        match self.number() {
            Some(n) => format!("#{}", n),
            None => "maintenance".to_string(),
        }
    }

    pub fn short_title(&self, max: usize) -> String {
        match self {
            Subject::Issue(issue) => issue.short_title(max),
            Subject::Maintenance => "General code maintenance".to_string(),
        }
    }
}

/// Which strategy handles a piece of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Documentation,
    ErrorHandling,
    EnvVars,
    Dependency,
    /// Generic improvement: `"use client"` directives.
    Directive,
    Maintenance,
}

impl StrategyKind {
    /// Fixed category → strategy mapping; anything without a dedicated
    /// strategy falls back to the generic improvement.
    pub fn for_category(category: Option<Category>) -> Self {
        match category {
            Some(Category::Documentation) => StrategyKind::Documentation,
            Some(Category::MissingEnv) => StrategyKind::EnvVars,
            Some(Category::ErrorHandling) => StrategyKind::ErrorHandling,
            Some(Category::Dependency) => StrategyKind::Dependency,
            Some(Category::MissingType)
            | Some(Category::MissingImport)
            | Some(Category::UnusedVariable)
            | Some(Category::Accessibility)
            | None => StrategyKind::Directive,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Documentation => "documentation",
            StrategyKind::ErrorHandling => "error_handling",
            StrategyKind::EnvVars => "env_vars",
            StrategyKind::Dependency => "dependency",
            StrategyKind::Directive => "generic_improvement",
            StrategyKind::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a strategy changed, for commit messages and PR bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub files: Vec<PathBuf>,
    pub notes: Vec<String>,
}

impl ChangeSet {
    pub fn touched(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.files.contains(&path) {
            self.files.push(path);
        }
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn merge(&mut self, other: ChangeSet) {
        for file in other.files {
            self.touched(file);
        }
        self.notes.extend(other.notes);
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.notes.is_empty()
    }

    /// Markdown bullet list of touched files.
    pub fn file_list(&self) -> String {
        self.files
            .iter()
            .map(|f| format!("- `{}`", f.display()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What strategies may touch while applying a fix.
pub struct FixContext<'a> {
    pub tree: &'a SourceTree,
    pub runner: &'a dyn CommandRunner,
    /// Declarations file, relative to the tree root.
    pub declarations: &'a Path,
    pub today: NaiveDate,
}

/// A self-contained transformation for one shape of issue.
#[async_trait]
pub trait FixStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Branch name stem, e.g. `docs-issue-42`.
    fn branch_stem(&self, subject: Subject<'_>) -> String;

    /// Inspect the tree and apply the transformation in place.
    ///
    /// Per-file failures are logged and skipped inside the strategy; an
    /// `Err` means the attempt as a whole failed.
    async fn apply(&self, subject: Subject<'_>, ctx: &FixContext<'_>) -> Result<ChangeSet>;

    fn commit_message(&self, subject: Subject<'_>, changes: &ChangeSet) -> String;

    fn draft(&self, subject: Subject<'_>, changes: &ChangeSet) -> PullRequestDraft;
}

/// Result of one workflow attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    /// Committed; `pull_request` is `None` in dry-run mode.
    Fixed {
        branch: String,
        pull_request: Option<String>,
    },
    /// The strategy ran but the tree is unchanged; trunk is checked out again.
    NoChange { branch: String },
}

impl FixOutcome {
    pub fn is_fixed(&self) -> bool {
        matches!(self, FixOutcome::Fixed { .. })
    }

    pub fn branch(&self) -> &str {
        match self {
            FixOutcome::Fixed { branch, .. } | FixOutcome::NoChange { branch } => branch,
        }
    }
}

/// `auto-fix/<stem>-<YYYYMMDD-HHMMSS>`
pub fn branch_name(stem: &str, now: chrono::DateTime<Local>) -> String {
    format!("{}/{}-{}", BRANCH_PREFIX, stem, now.format("%Y%m%d-%H%M%S"))
}

/// The steps every strategy shares: branch from trunk, apply, then commit,
/// push and open a pull request, or abandon the branch.
pub struct Workflow {
    config: Arc<AutofixConfig>,
    vcs: Arc<dyn VersionControl>,
    prs: Arc<dyn PullRequestCreator>,
    runner: Arc<dyn CommandRunner>,
    tree: SourceTree,
}

impl Workflow {
    pub fn new(
        config: Arc<AutofixConfig>,
        vcs: Arc<dyn VersionControl>,
        prs: Arc<dyn PullRequestCreator>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let tree = SourceTree::new(config.workdir.clone());
        Self {
            config,
            vcs,
            prs,
            runner,
            tree,
        }
    }

    pub fn config(&self) -> &AutofixConfig {
        &self.config
    }

    /// Run `strategy` on a fresh branch.
    ///
    /// The tree always ends on trunk. Branches that carry no commit are
    /// deleted; on error the tree is force-reset first and the error returned.
    pub async fn attempt(
        &self,
        strategy: &dyn FixStrategy,
        subject: Subject<'_>,
    ) -> Result<FixOutcome> {
        let now = Local::now();
        let branch = branch_name(&strategy.branch_stem(subject), now);

        let result = self.attempt_on(strategy, subject, &branch, now).await;
        if result.is_err() {
            match self.vcs.reset_to_trunk().await {
                Ok(()) => self.discard_branch(&branch).await,
                Err(err) => {
                    tracing::error!(error = %format!("{:#}", err), "failed to reset working tree to trunk");
                }
            }
        }
        result
    }

    async fn attempt_on(
        &self,
        strategy: &dyn FixStrategy,
        subject: Subject<'_>,
        branch: &str,
        now: chrono::DateTime<Local>,
    ) -> Result<FixOutcome> {
        self.vcs.start_branch(branch).await?;
        tracing::info!(branch = %branch, strategy = %strategy.kind(), "started branch");

        let ctx = FixContext {
            tree: &self.tree,
            runner: self.runner.as_ref(),
            declarations: &self.config.declarations_file,
            today: now.date_naive(),
        };
        let changes = strategy.apply(subject, &ctx).await?;

        if !self.vcs.has_changes().await? {
            tracing::info!(branch = %branch, "no working-tree changes, abandoning branch");
            self.vcs.return_to_trunk().await?;
            self.discard_branch(branch).await;
            return Ok(FixOutcome::NoChange {
                branch: branch.to_string(),
            });
        }

        self.vcs
            .commit_all(&strategy.commit_message(subject, &changes))
            .await?;

        if self.config.dry_run {
            tracing::info!(branch = %branch, "dry run: not pushing or opening a pull request");
            self.vcs.return_to_trunk().await?;
            return Ok(FixOutcome::Fixed {
                branch: branch.to_string(),
                pull_request: None,
            });
        }

        self.vcs.push(branch).await?;
        let request = NewPullRequest {
            draft: strategy.draft(subject, &changes),
            head: branch.to_string(),
            base: self.vcs.trunk().to_string(),
            assignee: self.config.assignee.clone(),
            closes: subject.number(),
        };
        let url = self.prs.create(&request).await?;
        Ok(FixOutcome::Fixed {
            branch: branch.to_string(),
            pull_request: Some(url),
        })
    }

    async fn discard_branch(&self, branch: &str) {
        if let Err(err) = self.vcs.delete_branch(branch).await {
            tracing::warn!(branch = %branch, error = %format!("{:#}", err), "failed to delete abandoned branch");
        }
    }
}
