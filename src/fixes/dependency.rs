//! Dependency updates through npm.

use anyhow::Result;
use async_trait::async_trait;

use super::{ChangeSet, FixContext, FixStrategy, StrategyKind, Subject};
use crate::pull_request::PullRequestDraft;
use crate::runner::display_command;

/// Which tool run an issue asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyAction {
    /// `npm audit fix`
    Audit,
    /// patch-level bumps via npm-check-updates, then reinstall
    Update,
}

impl DependencyAction {
    /// Security wording wins over update wording.
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.to_lowercase();
        if text.contains("vulnerab") || text.contains("security") {
            Some(DependencyAction::Audit)
        } else if text.contains("outdated") || text.contains("update") {
            Some(DependencyAction::Update)
        } else {
            None
        }
    }

    pub fn commands(self) -> &'static [ToolCommand] {
        match self {
            DependencyAction::Audit => AUDIT_COMMANDS,
            DependencyAction::Update => UPDATE_COMMANDS,
        }
    }
}

pub type ToolCommand = (&'static str, &'static [&'static str]);

const AUDIT_COMMANDS: &[ToolCommand] = &[("npm", &["audit", "fix"])];

const UPDATE_COMMANDS: &[ToolCommand] = &[
    ("npx", &["npm-check-updates", "--target", "patch", "-u"]),
    ("npm", &["install", "--ignore-scripts"]),
];

#[derive(Debug, Default)]
pub struct DependencyStrategy;

#[async_trait]
impl FixStrategy for DependencyStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Dependency
    }

    fn branch_stem(&self, subject: Subject<'_>) -> String {
        format!("deps-{}", subject.tag())
    }

    /// Tool failures are logged and ignored; whether anything changed is
    /// decided by the working tree afterwards.
    async fn apply(&self, subject: Subject<'_>, ctx: &FixContext<'_>) -> Result<ChangeSet> {
        let mut changes = ChangeSet::default();
        let Some(action) = DependencyAction::from_text(&subject.text()) else {
            tracing::info!("issue does not ask for an audit or an update");
            return Ok(changes);
        };

        for (program, args) in action.commands() {
            let command = display_command(program, args);
            match ctx.runner.run(program, args, ctx.tree.root()).await {
                Ok(output) if output.is_success() => changes.note(command),
                Ok(output) => {
                    tracing::warn!(command = %command, stderr = %output.stderr, "dependency tool failed");
                }
                Err(err) => {
                    tracing::warn!(command = %command, error = %err, "dependency tool could not run");
                }
            }
        }
        Ok(changes)
    }

    fn commit_message(&self, subject: Subject<'_>, _changes: &ChangeSet) -> String {
        format!("fix(deps): resolve dependency issue (fixes {})", subject.reference())
    }

    fn draft(&self, subject: Subject<'_>, changes: &ChangeSet) -> PullRequestDraft {
        let ran = changes
            .notes
            .iter()
            .map(|c| format!("- `{}`", c))
            .collect::<Vec<_>>()
            .join("\n");
        PullRequestDraft {
            title: format!("fix(deps): {}", subject.short_title(60)),
            body: format!(
                "## Dependency Fix\n\nAddresses {}.\n\n### Commands\n{}\n",
                subject.reference(),
                ran
            ),
            labels: vec![
                "dependencies".to_string(),
                "automated".to_string(),
                "auto-fix".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::SourceTree;
    use crate::github::Issue;
    use crate::runner::CommandOutput;
    use crate::testing::ScriptedRunner;
    use chrono::NaiveDate;
    use std::path::Path;
    use tempfile::tempdir;

    fn issue(title: &str, body: &str) -> Issue {
        Issue {
            number: 8,
            title: title.to_string(),
            body: Some(body.to_string()),
            labels: vec![],
            is_pull_request: false,
        }
    }

    #[test]
    fn test_action_from_text() {
        assert_eq!(
            DependencyAction::from_text("Vulnerable lodash version"),
            Some(DependencyAction::Audit)
        );
        assert_eq!(
            DependencyAction::from_text("outdated packages, also a SECURITY concern"),
            Some(DependencyAction::Audit)
        );
        assert_eq!(
            DependencyAction::from_text("Please update next"),
            Some(DependencyAction::Update)
        );
        assert_eq!(DependencyAction::from_text("package.json is messy"), None);
    }

    async fn run(issue: &Issue, runner: &ScriptedRunner) -> ChangeSet {
        let dir = tempdir().unwrap();
        let tree = SourceTree::new(dir.path());
        let ctx = FixContext {
            tree: &tree,
            runner,
            declarations: Path::new(".env.example"),
            today: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
        };
        DependencyStrategy
            .apply(Subject::Issue(issue), &ctx)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_audit_runs_npm_audit_fix() {
        let runner = ScriptedRunner::new();
        let changes = run(&issue("Security advisory", "lodash is vulnerable"), &runner).await;
        assert_eq!(runner.command_lines(), vec!["npm audit fix"]);
        assert_eq!(changes.notes, vec!["npm audit fix"]);
    }

    #[tokio::test]
    async fn test_update_runs_ncu_then_install() {
        let runner = ScriptedRunner::new();
        run(&issue("Outdated deps", ""), &runner).await;
        assert_eq!(
            runner.command_lines(),
            vec![
                "npx npm-check-updates --target patch -u",
                "npm install --ignore-scripts",
            ]
        );
    }

    #[tokio::test]
    async fn test_tool_failure_is_not_an_error() {
        let runner = ScriptedRunner::new();
        runner.respond("npm", CommandOutput::failure(1, "ERESOLVE"));
        let changes = run(&issue("vulnerable", ""), &runner).await;
        assert!(changes.is_empty());
    }

    #[tokio::test]
    async fn test_no_keyword_runs_nothing() {
        let runner = ScriptedRunner::new();
        let changes = run(&issue("package name typo", ""), &runner).await;
        assert!(runner.command_lines().is_empty());
        assert!(changes.is_empty());
    }
}
