//! Environment-variable declarations.
//!
//! The declarations file (`.env.example` by default) is append-only: names
//! referenced in source but not declared are appended as empty values under
//! a dated header. A key already present on a left-hand side is never
//! appended again.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{ChangeSet, FixContext, FixStrategy, StrategyKind, Subject};
use crate::discovery::SCRIPT_EXTENSIONS;
use crate::errors::AutofixError;
use crate::pull_request::PullRequestDraft;

/// Left-hand-side keys declared in a declarations file.
pub fn declared_keys(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .filter(|line| line.contains('=') && !line.trim_start().starts_with('#'))
        .filter_map(|line| line.split('=').next())
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .collect()
}

/// Discovered names that are not declared yet, sorted.
pub fn missing_keys(discovered: &BTreeSet<String>, declared: &BTreeSet<String>) -> Vec<String> {
    discovered.difference(declared).cloned().collect()
}

/// The text appended for `keys`.
pub fn render_block(keys: &[String], today: NaiveDate) -> String {
    let mut block = String::from("\n# ── Auto-discovered environment variables ──\n");
    block.push_str(&format!(
        "# Added by auto-fix workflow on {}\n",
        today.format("%Y-%m-%d")
    ));
    for key in keys {
        block.push_str(key);
        block.push_str("=\n");
    }
    block
}

/// The declarations file in a working tree.
pub struct EnvRegistry {
    path: PathBuf,
}

impl EnvRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Declared keys; a missing file declares nothing.
    pub fn load(&self) -> Result<BTreeSet<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(declared_keys(&content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeSet::new()),
            Err(source) => Err(AutofixError::Declarations {
                path: self.path.clone(),
                source,
            }
            .into()),
        }
    }

    /// Append `keys` under a dated header, creating the file if needed.
    pub fn append(&self, keys: &[String], today: NaiveDate) -> Result<()> {
        let declarations_err = |source: std::io::Error| AutofixError::Declarations {
            path: self.path.clone(),
            source,
        };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(declarations_err)?;
        file.write_all(render_block(keys, today).as_bytes())
            .map_err(declarations_err)?;
        Ok(())
    }
}

/// Append undeclared names referenced in the tree.
///
/// At most `limit` keys are added when a limit is given.
pub fn sync_declarations(
    ctx: &FixContext<'_>,
    extensions: &[&str],
    limit: Option<usize>,
) -> Result<Vec<String>> {
    let discovered = ctx.tree.env_references(extensions);
    if discovered.is_empty() {
        return Ok(Vec::new());
    }
    let registry = EnvRegistry::new(ctx.tree.resolve(ctx.declarations));
    let mut missing = missing_keys(&discovered, &registry.load()?);
    if let Some(limit) = limit {
        missing.truncate(limit);
    }
    if !missing.is_empty() {
        registry.append(&missing, ctx.today)?;
        tracing::info!(
            file = %ctx.declarations.display(),
            count = missing.len(),
            "appended environment variable declarations"
        );
    }
    Ok(missing)
}

#[derive(Debug, Default)]
pub struct EnvVarsStrategy;

fn declarations_name(changes: &ChangeSet) -> String {
    changes
        .files
        .first()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".env.example".to_string())
}

#[async_trait]
impl FixStrategy for EnvVarsStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::EnvVars
    }

    fn branch_stem(&self, subject: Subject<'_>) -> String {
        format!("env-docs-{}", subject.tag())
    }

    async fn apply(&self, _subject: Subject<'_>, ctx: &FixContext<'_>) -> Result<ChangeSet> {
        let mut changes = ChangeSet::default();
        let added = sync_declarations(ctx, SCRIPT_EXTENSIONS, None)?;
        if !added.is_empty() {
            changes.touched(ctx.declarations);
            changes.notes.extend(added);
        }
        Ok(changes)
    }

    fn commit_message(&self, subject: Subject<'_>, changes: &ChangeSet) -> String {
        format!(
            "docs: update {} with missing variables (fixes {})\n\nAdded {} missing environment variables.",
            declarations_name(changes),
            subject.reference(),
            changes.notes.len()
        )
    }

    fn draft(&self, subject: Subject<'_>, changes: &ChangeSet) -> PullRequestDraft {
        let vars = changes
            .notes
            .iter()
            .map(|v| format!("- `{}`", v))
            .collect::<Vec<_>>()
            .join("\n");
        PullRequestDraft {
            title: format!(
                "docs: Update {} - {}",
                declarations_name(changes),
                subject.reference()
            ),
            body: format!(
                "## Environment Variables\n\nAddresses {} by declaring environment variables the code reads.\n\n### Added Variables\n{}\n",
                subject.reference(),
                vars
            ),
            labels: vec!["documentation".to_string(), "auto-fix".to_string()],
        }
    }
}

/// Relative path check used by callers that gate on the file existing.
pub fn declarations_exist(tree_root: &Path, declarations: &Path) -> bool {
    EnvRegistry::new(tree_root.join(declarations)).exists()
}
