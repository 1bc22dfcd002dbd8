//! One scheduled pass: list, filter, classify, fix, report.
//!
//! Issues are processed strictly one after another; every fix owns the
//! working tree from branch creation until it is back on trunk.

use std::sync::Arc;

use crate::classifier::{Category, Classifier};
use crate::config::AutofixConfig;
use crate::dispatch::{AttemptStatus, Dispatcher};
use crate::fixes::FixOutcome;
use crate::github::{Issue, IssueTracker};
use crate::report::RunSummary;
use crate::ui;

/// Posted on an issue once its pull request is open.
pub const FIX_COMMENT: &str = "I've created a PR to address this issue. Please review the changes.";

/// Issues gathered per fix slot, so later candidates can stand in for no-ops.
const BACKLOG_FACTOR: usize = 2;

/// Open issues worth attempting, with their categories, in listing order.
///
/// Collection stops once the backlog holds `BACKLOG_FACTOR × max_fixes`
/// entries.
pub fn select_candidates(
    issues: Vec<Issue>,
    config: &AutofixConfig,
    classifier: &Classifier,
) -> Vec<(Issue, Option<Category>)> {
    let backlog = config.max_fixes.saturating_mul(BACKLOG_FACTOR);
    let mut candidates = Vec::new();
    for issue in issues {
        if issue.is_pull_request {
            continue;
        }
        if let Some(label) = config
            .excluded_labels
            .iter()
            .find(|label| issue.has_label(label))
        {
            tracing::debug!(issue = issue.number, label = %label, "skipping excluded issue");
            continue;
        }

        let category = classifier.classify(&issue);
        ui::print_candidate(&issue, category);
        candidates.push((issue, category));

        if candidates.len() >= backlog {
            break;
        }
    }
    candidates
}

/// Run the maintenance pass and report how it went.
pub async fn run_maintenance(dispatcher: &Dispatcher) -> AttemptStatus {
    let outcome = dispatcher.maintain().await;
    ui::print_maintenance(&outcome);
    match outcome {
        Ok(FixOutcome::Fixed { pull_request, .. }) => AttemptStatus::Fixed { pull_request },
        Ok(FixOutcome::NoChange { .. }) => AttemptStatus::NoChange,
        Err(err) => AttemptStatus::Failed(format!("{:#}", err)),
    }
}

pub struct Orchestrator {
    tracker: Arc<dyn IssueTracker>,
    dispatcher: Dispatcher,
    classifier: &'static Classifier,
}

impl Orchestrator {
    pub fn new(tracker: Arc<dyn IssueTracker>, dispatcher: Dispatcher) -> Self {
        Self {
            tracker,
            dispatcher,
            classifier: Classifier::standard(),
        }
    }

    fn config(&self) -> &AutofixConfig {
        self.dispatcher.workflow().config()
    }

    pub async fn run(&self) -> RunSummary {
        let config = self.config();
        let mut summary = RunSummary::new(config.max_fixes);

        let issues = match self.tracker.list_open_issues().await {
            Ok(issues) => issues,
            Err(err) => {
                tracing::error!(error = %format!("{:#}", err), "failed to list open issues");
                ui::print_listing_failed(&err);
                summary.listing_failed = true;
                return summary;
            }
        };
        ui::print_issue_count(issues.len());

        let candidates = select_candidates(issues, config, self.classifier);
        if candidates.is_empty() {
            ui::print_no_fixable();
            summary.maintenance = Some(run_maintenance(&self.dispatcher).await);
            return summary;
        }

        for (issue, category) in &candidates {
            if summary.fixes_applied() >= config.max_fixes {
                break;
            }
            ui::print_fix_start(issue, *category);
            let attempt = self.dispatcher.dispatch(issue, *category).await;
            ui::print_attempt(&attempt);

            if attempt.is_fixed()
                && !config.dry_run
                && let Err(err) = self.tracker.comment(issue.number, FIX_COMMENT).await
            {
                tracing::warn!(issue = issue.number, error = %format!("{:#}", err), "failed to comment on issue");
            }
            summary.attempts.push(attempt);
        }

        summary
    }
}
