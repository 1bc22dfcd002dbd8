//! Doc-comment stubs above exported functions.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::{ChangeSet, DEFAULT_FILE_LIMIT, FixContext, FixStrategy, StrategyKind, Subject};
use crate::discovery::TYPESCRIPT_EXTENSIONS;
use crate::pull_request::PullRequestDraft;

/// How many lines above an export are searched for the end of a doc block.
const LOOKBACK_LINES: usize = 5;

static EXPORTED_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^export\s+(async\s+)?function\s+\w+").unwrap());

static FUNCTION_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^export\s+(?:async\s+)?function\s+(\w+)\s*\(([^)]*)\)").unwrap()
});

static MENTIONED_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w/]+\.(?:tsx|ts|jsx|js|md)\b").unwrap());

/// Parameter names from a parameter list, without annotations or `?`.
fn parameter_names(params: &str) -> Vec<String> {
    params
        .split(',')
        .filter_map(|p| {
            let name = p.split(':').next()?.split('?').next()?.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

fn doc_block(name: &str, params: &[String]) -> Vec<String> {
    let mut block = vec!["/**".to_string(), format!(" * {} - TODO: Add description", name)];
    block.extend(
        params
            .iter()
            .map(|p| format!(" * @param {} - TODO: Add param description", p)),
    );
    block.push(" */".to_string());
    block
}

/// Insert doc-comment stubs above undocumented exported functions.
///
/// Returns `None` when every exported function already has a `*/` within
/// the lookback window, so a second pass over the output is a no-op.
pub fn add_doc_comments(content: &str) -> Option<String> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut modified = false;

    for (i, line) in lines.iter().enumerate() {
        if EXPORTED_FUNCTION.is_match(line) {
            let window = &lines[i.saturating_sub(LOOKBACK_LINES)..i];
            let documented = window.iter().any(|l| l.contains("*/"));
            if !documented && let Some(caps) = FUNCTION_SIGNATURE.captures(line) {
                let params = parameter_names(caps[2].trim());
                out.extend(doc_block(&caps[1], &params));
                modified = true;
            }
        }
        out.push((*line).to_string());
    }

    modified.then(|| out.join("\n"))
}

/// Script or markdown paths named in free text.
pub fn mentioned_files(text: &str) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    for m in MENTIONED_FILE.find_iter(text) {
        let path = m.as_str().trim_start_matches('/').to_string();
        if !files.contains(&path) {
            files.push(path);
        }
    }
    files
}

#[derive(Debug, Default)]
pub struct DocumentationStrategy;

impl DocumentationStrategy {
    /// Rewrite one file; errors are logged and count as "no change".
    fn document_file(&self, ctx: &FixContext<'_>, path: &Path) -> bool {
        let full = ctx.tree.resolve(path);
        let content = match std::fs::read_to_string(&full) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read file");
                return false;
            }
        };
        let Some(updated) = add_doc_comments(&content) else {
            return false;
        };
        match std::fs::write(&full, updated) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to write file");
                false
            }
        }
    }
}

#[async_trait]
impl FixStrategy for DocumentationStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Documentation
    }

    fn branch_stem(&self, subject: Subject<'_>) -> String {
        format!("docs-issue-{}", subject.tag())
    }

    async fn apply(&self, subject: Subject<'_>, ctx: &FixContext<'_>) -> Result<ChangeSet> {
        let mut changes = ChangeSet::default();
        let mentioned: Vec<PathBuf> = mentioned_files(&subject.text())
            .into_iter()
            .map(PathBuf::from)
            .filter(|p| ctx.tree.exists(p))
            .collect();

        if !mentioned.is_empty() {
            for path in &mentioned {
                if self.document_file(ctx, path) {
                    changes.touched(path.clone());
                }
            }
            return Ok(changes);
        }

        let candidates = ctx.tree.source_files(TYPESCRIPT_EXTENSIONS);
        for path in candidates.iter().take(DEFAULT_FILE_LIMIT) {
            if self.document_file(ctx, path) {
                changes.touched(path.clone());
                break;
            }
        }
        Ok(changes)
    }

    fn commit_message(&self, subject: Subject<'_>, _changes: &ChangeSet) -> String {
        format!(
            "docs: improve documentation (fixes {})\n\nAdded doc comments to exported functions.",
            subject.reference()
        )
    }

    fn draft(&self, subject: Subject<'_>, changes: &ChangeSet) -> PullRequestDraft {
        PullRequestDraft {
            title: format!("docs: {}", subject.short_title(60)),
            body: format!(
                "## Documentation Improvement\n\nAddresses {} by adding doc comment stubs to exported functions.\n\n### Files\n{}\n",
                subject.reference(),
                changes.file_list()
            ),
            labels: vec![
                "documentation".to_string(),
                "automated".to_string(),
                "auto-fix".to_string(),
            ],
        }
    }
}
