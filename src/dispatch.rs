//! Category → strategy dispatch with per-issue recovery.

use anyhow::Result;

use crate::classifier::Category;
use crate::fixes::dependency::DependencyStrategy;
use crate::fixes::directive::DirectiveStrategy;
use crate::fixes::documentation::DocumentationStrategy;
use crate::fixes::env_vars::EnvVarsStrategy;
use crate::fixes::error_handling::ErrorHandlingStrategy;
use crate::fixes::maintenance::MaintenanceStrategy;
use crate::fixes::{FixOutcome, FixStrategy, StrategyKind, Subject, Workflow};
use crate::github::Issue;

/// How one attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    /// Committed; `pull_request` is `None` in dry-run mode.
    Fixed { pull_request: Option<String> },
    /// The strategy found nothing to change.
    NoChange,
    /// The attempt errored and the tree was reset to trunk.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixAttempt {
    pub issue_number: u64,
    pub category: Option<Category>,
    pub strategy: StrategyKind,
    pub branch: Option<String>,
    pub status: AttemptStatus,
}

impl FixAttempt {
    pub fn is_fixed(&self) -> bool {
        matches!(self.status, AttemptStatus::Fixed { .. })
    }
}

pub struct Dispatcher {
    workflow: Workflow,
    documentation: DocumentationStrategy,
    error_handling: ErrorHandlingStrategy,
    env_vars: EnvVarsStrategy,
    dependency: DependencyStrategy,
    directive: DirectiveStrategy,
    maintenance: MaintenanceStrategy,
}

impl Dispatcher {
    pub fn new(workflow: Workflow) -> Self {
        Self {
            workflow,
            documentation: DocumentationStrategy,
            error_handling: ErrorHandlingStrategy,
            env_vars: EnvVarsStrategy,
            dependency: DependencyStrategy,
            directive: DirectiveStrategy,
            maintenance: MaintenanceStrategy,
        }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    fn strategy(&self, kind: StrategyKind) -> &dyn FixStrategy {
        match kind {
            StrategyKind::Documentation => &self.documentation,
            StrategyKind::ErrorHandling => &self.error_handling,
            StrategyKind::EnvVars => &self.env_vars,
            StrategyKind::Dependency => &self.dependency,
            StrategyKind::Directive => &self.directive,
            StrategyKind::Maintenance => &self.maintenance,
        }
    }

    /// Run the strategy for `category` against `issue`.
    ///
    /// Never returns an error: a failed attempt force-resets the tree to
    /// trunk and is recorded as [`AttemptStatus::Failed`].
    pub async fn dispatch(&self, issue: &Issue, category: Option<Category>) -> FixAttempt {
        let kind = StrategyKind::for_category(category);
        let strategy = self.strategy(kind);
        tracing::info!(issue = issue.number, strategy = %kind, "dispatching");

        let (branch, status) = match self.run(strategy, Subject::Issue(issue)).await {
            Ok(outcome) => {
                let branch = Some(outcome.branch().to_string());
                let status = match outcome {
                    FixOutcome::Fixed { pull_request, .. } => AttemptStatus::Fixed { pull_request },
                    FixOutcome::NoChange { .. } => AttemptStatus::NoChange,
                };
                (branch, status)
            }
            Err(err) => (None, AttemptStatus::Failed(format!("{:#}", err))),
        };

        FixAttempt {
            issue_number: issue.number,
            category,
            strategy: kind,
            branch,
            status,
        }
    }

    /// The repository-wide pass.
    pub async fn maintain(&self) -> Result<FixOutcome> {
        self.run(&self.maintenance, Subject::Maintenance).await
    }

    async fn run(&self, strategy: &dyn FixStrategy, subject: Subject<'_>) -> Result<FixOutcome> {
        let result = self.workflow.attempt(strategy, subject).await;
        if let Err(err) = &result {
            tracing::error!(subject = %subject.reference(), error = %format!("{:#}", err), "fix attempt failed");
        }
        result
    }
}
