//! `"use client"` directives for modules that use React hooks.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

use super::{ChangeSet, DEFAULT_FILE_LIMIT, FixContext, FixStrategy, StrategyKind, Subject};
use crate::discovery::TYPESCRIPT_EXTENSIONS;
use crate::pull_request::PullRequestDraft;

pub const CLIENT_DIRECTIVE: &str = "\"use client\";";

/// Candidate selection for one directive pass.
pub struct DirectiveScan {
    /// Files whose content matches are candidates.
    hooks: &'static LazyLock<Regex>,
    extensions: &'static [&'static str],
    limit: usize,
    /// A candidate is only rewritten if it also imports a hook.
    hook_import: &'static LazyLock<Regex>,
}

static ANY_HOOK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"useState|useEffect|useRef|useCallback|useMemo|useContext").unwrap()
});

static ANY_HOOK_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"import.*\{.*use(State|Effect|Ref|Callback|Memo|Context)").unwrap()
});

static STATE_HOOK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"useState|useEffect").unwrap());

static STATE_HOOK_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"use(State|Effect)").unwrap());

/// Issue-driven pass: any hook, any TypeScript module.
pub static GENERIC_SCAN: DirectiveScan = DirectiveScan {
    hooks: &ANY_HOOK,
    extensions: TYPESCRIPT_EXTENSIONS,
    limit: DEFAULT_FILE_LIMIT,
    hook_import: &ANY_HOOK_IMPORT,
};

/// Maintenance pass: state and effect hooks in `.tsx` components only.
pub static MAINTENANCE_SCAN: DirectiveScan = DirectiveScan {
    hooks: &STATE_HOOK,
    extensions: &["tsx"],
    limit: 3,
    hook_import: &STATE_HOOK_IMPORT,
};

pub fn has_client_directive(content: &str) -> bool {
    content.contains("'use client'") || content.contains("\"use client\"")
}

/// Prepend the directive when the module imports a hook and lacks one.
pub fn add_client_directive(content: &str, hook_import: &Regex) -> Option<String> {
    if has_client_directive(content) || !hook_import.is_match(content) {
        return None;
    }
    Some(format!("{}\n\n{}", CLIENT_DIRECTIVE, content))
}

impl DirectiveScan {
    /// Rewrite candidates in place and return the files changed.
    pub fn run(&self, ctx: &FixContext<'_>) -> Vec<PathBuf> {
        let mut changed = Vec::new();
        for path in ctx.tree.files_matching(self.hooks, self.extensions, self.limit) {
            let full = ctx.tree.resolve(&path);
            let content = match std::fs::read_to_string(&full) {
                Ok(c) => c,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "failed to read component");
                    continue;
                }
            };
            let Some(updated) = add_client_directive(&content, self.hook_import) else {
                continue;
            };
            match std::fs::write(&full, updated) {
                Ok(()) => changed.push(path),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "failed to write component");
                }
            }
        }
        changed
    }
}

/// Fallback strategy for categories without a dedicated fix.
#[derive(Debug, Default)]
pub struct DirectiveStrategy;

#[async_trait]
impl FixStrategy for DirectiveStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Directive
    }

    fn branch_stem(&self, subject: Subject<'_>) -> String {
        format!("improve-{}", subject.tag())
    }

    async fn apply(&self, _subject: Subject<'_>, ctx: &FixContext<'_>) -> Result<ChangeSet> {
        let mut changes = ChangeSet::default();
        for path in GENERIC_SCAN.run(ctx) {
            changes.touched(path);
        }
        Ok(changes)
    }

    fn commit_message(&self, subject: Subject<'_>, _changes: &ChangeSet) -> String {
        format!(
            "fix: add client directives (fixes {})\n\nMarked hook-using modules as client components.",
            subject.reference()
        )
    }

    fn draft(&self, subject: Subject<'_>, changes: &ChangeSet) -> PullRequestDraft {
        PullRequestDraft {
            title: format!("fix: Code improvements for {}", subject.reference()),
            body: format!(
                "## Code Improvements\n\nAddresses {}.\n\nAdded missing `\"use client\"` directives to modules that use React hooks.\n\n### Files\n{}\n",
                subject.reference(),
                changes.file_list()
            ),
            labels: vec!["enhancement".to_string(), "auto-fix".to_string()],
        }
    }
}
