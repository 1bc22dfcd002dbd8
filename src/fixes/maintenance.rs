//! Repository-wide pass used when no issue is left to work on.

use anyhow::Result;
use async_trait::async_trait;

use super::directive::MAINTENANCE_SCAN;
use super::env_vars::{declarations_exist, sync_declarations};
use super::{ChangeSet, FixContext, FixStrategy, StrategyKind, Subject};
use crate::discovery::TYPESCRIPT_EXTENSIONS;
use crate::pull_request::PullRequestDraft;

/// New declarations added per maintenance run.
const MAX_NEW_DECLARATIONS: usize = 5;

#[derive(Debug, Default)]
pub struct MaintenanceStrategy;

#[async_trait]
impl FixStrategy for MaintenanceStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Maintenance
    }

    fn branch_stem(&self, _subject: Subject<'_>) -> String {
        "maintenance".to_string()
    }

    /// Declarations are only topped up when the file is already there; this
    /// pass never creates it.
    async fn apply(&self, _subject: Subject<'_>, ctx: &FixContext<'_>) -> Result<ChangeSet> {
        let mut changes = ChangeSet::default();

        if declarations_exist(ctx.tree.root(), ctx.declarations) {
            let added = sync_declarations(ctx, TYPESCRIPT_EXTENSIONS, Some(MAX_NEW_DECLARATIONS))?;
            if !added.is_empty() {
                changes.touched(ctx.declarations);
                changes.notes.extend(added);
            }
        } else {
            tracing::debug!(file = %ctx.declarations.display(), "no declarations file, skipping env sync");
        }

        let mut directives = ChangeSet::default();
        for path in MAINTENANCE_SCAN.run(ctx) {
            directives.touched(path);
        }
        changes.merge(directives);
        Ok(changes)
    }

    fn commit_message(&self, _subject: Subject<'_>, _changes: &ChangeSet) -> String {
        "chore: general code maintenance\n\n- Updated environment variable documentation\n- Added missing React directives".to_string()
    }

    fn draft(&self, _subject: Subject<'_>, changes: &ChangeSet) -> PullRequestDraft {
        let mut body = String::from("## Maintenance PR\n\nGeneral code maintenance:\n\n");
        if !changes.notes.is_empty() {
            body.push_str(&format!(
                "- Declared environment variables: {}\n",
                changes.notes.join(", ")
            ));
        }
        body.push_str("- Added missing `\"use client\"` directives where hooks are imported\n");
        body.push_str(&format!("\n### Files\n{}\n", changes.file_list()));
        PullRequestDraft {
            title: "chore: General code maintenance".to_string(),
            body,
            labels: vec!["maintenance".to_string(), "auto-fix".to_string()],
        }
    }
}
