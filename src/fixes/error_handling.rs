//! TODO markers above route handlers that have no error handling.
//!
//! Rewriting handler bodies automatically is too risky; the marker makes the
//! gap visible in review instead.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use super::{ChangeSet, DEFAULT_FILE_LIMIT, FixContext, FixStrategy, StrategyKind, Subject};
use crate::pull_request::PullRequestDraft;

pub const ERROR_HANDLING_MARKER: &str = "// TODO: Add proper try-catch error handling";

const HANDLER_DECLARATION: &str = "export async function";

static HTTP_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s+async\s+function\s+(GET|POST|PUT|DELETE|PATCH)\b").unwrap()
});

/// Insert the marker before the first handler declaration, if needed.
pub fn add_error_marker(content: &str) -> Option<String> {
    if content.contains("try") && content.contains("catch") {
        return None;
    }
    if !HTTP_HANDLER.is_match(content)
        || content.contains("try {")
        || content.contains(ERROR_HANDLING_MARKER)
    {
        return None;
    }
    let idx = content.find(HANDLER_DECLARATION)?;
    let mut out = String::with_capacity(content.len() + ERROR_HANDLING_MARKER.len() + 1);
    out.push_str(&content[..idx]);
    out.push_str(ERROR_HANDLING_MARKER);
    out.push('\n');
    out.push_str(&content[idx..]);
    Some(out)
}

#[derive(Debug, Default)]
pub struct ErrorHandlingStrategy;

#[async_trait]
impl FixStrategy for ErrorHandlingStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ErrorHandling
    }

    fn branch_stem(&self, subject: Subject<'_>) -> String {
        format!("error-handling-{}", subject.tag())
    }

    async fn apply(&self, _subject: Subject<'_>, ctx: &FixContext<'_>) -> Result<ChangeSet> {
        let mut changes = ChangeSet::default();
        for path in ctx.tree.route_handlers(DEFAULT_FILE_LIMIT) {
            let full = ctx.tree.resolve(&path);
            let content = match std::fs::read_to_string(&full) {
                Ok(c) => c,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "failed to read route handler");
                    continue;
                }
            };
            let Some(updated) = add_error_marker(&content) else {
                continue;
            };
            if let Err(err) = std::fs::write(&full, updated) {
                tracing::warn!(path = %path.display(), error = %err, "failed to write route handler");
                continue;
            }
            changes.touched(path);
        }
        Ok(changes)
    }

    fn commit_message(&self, subject: Subject<'_>, _changes: &ChangeSet) -> String {
        format!(
            "fix: flag missing error handling (fixes {})\n\nMarked API route handlers that lack try/catch.",
            subject.reference()
        )
    }

    fn draft(&self, subject: Subject<'_>, changes: &ChangeSet) -> PullRequestDraft {
        PullRequestDraft {
            title: format!("fix: Improve error handling - {}", subject.reference()),
            body: format!(
                "## Error Handling\n\nAddresses {} by marking route handlers that have no try/catch.\n\n### Files\n{}\n",
                subject.reference(),
                changes.file_list()
            ),
            labels: vec![
                "bug".to_string(),
                "error-handling".to_string(),
                "automated".to_string(),
                "auto-fix".to_string(),
            ],
        }
    }
}
