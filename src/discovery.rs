//! Bounded, read-only discovery over the working tree.
//!
//! Walks are sorted by file name so that "the first N files" is stable
//! between runs, and never descend into dependency or build directories.

use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::{DirEntry, WalkDir};

/// Directories that never contain first-party source.
const SKIPPED_DIRS: &[&str] = &["node_modules", ".next", ".git", "dist", "build", "coverage"];

/// All script sources the strategies look at.
pub const SCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];
pub const TYPESCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx"];

static ENV_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"process\.env\.([A-Z_][A-Z0-9_]*)").unwrap());

/// Route handler file names under `app/api`.
const ROUTE_FILE_NAMES: &[&str] = &["route.ts", "route.js"];

/// A working tree rooted at `root`. Paths handed out are relative to it.
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}

impl SourceTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a tree-relative path.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    pub fn exists(&self, relative: impl AsRef<Path>) -> bool {
        self.resolve(relative).is_file()
    }

    fn walk_from(&self, start: &Path) -> impl Iterator<Item = PathBuf> + '_ {
        WalkDir::new(start)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped(e))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.path().strip_prefix(&self.root).ok().map(Path::to_path_buf))
    }

    /// Every source file with one of `extensions`, in walk order.
    pub fn source_files(&self, extensions: &[&str]) -> Vec<PathBuf> {
        self.walk_from(&self.root)
            .filter(|p| has_extension(p, extensions))
            .collect()
    }

    /// The first `limit` files whose content matches `pattern`.
    /// Unreadable files are skipped.
    pub fn files_matching(&self, pattern: &Regex, extensions: &[&str], limit: usize) -> Vec<PathBuf> {
        self.walk_from(&self.root)
            .filter(|p| has_extension(p, extensions))
            .filter(|p| match std::fs::read_to_string(self.resolve(p)) {
                Ok(content) => pattern.is_match(&content),
                Err(err) => {
                    tracing::debug!(path = %p.display(), error = %err, "skipping unreadable file");
                    false
                }
            })
            .take(limit)
            .collect()
    }

    /// The first `limit` API route handler files under `app/api`.
    pub fn route_handlers(&self, limit: usize) -> Vec<PathBuf> {
        let api_dir = self.root.join("app").join("api");
        if !api_dir.is_dir() {
            return Vec::new();
        }
        self.walk_from(&api_dir)
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| ROUTE_FILE_NAMES.contains(&n))
            })
            .take(limit)
            .collect()
    }

    /// Names referenced as `process.env.NAME` anywhere in the tree.
    pub fn env_references(&self, extensions: &[&str]) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for path in self.source_files(extensions) {
            match std::fs::read_to_string(self.resolve(&path)) {
                Ok(content) => names.extend(env_references_in(&content)),
                Err(err) => {
                    tracing::debug!(path = %path.display(), error = %err, "skipping unreadable file");
                }
            }
        }
        names
    }
}

/// `process.env.NAME` references in one source text.
pub fn env_references_in(content: &str) -> BTreeSet<String> {
    ENV_REFERENCE
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect()
}
