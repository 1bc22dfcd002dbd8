//! Branch lifecycle over the trunk.
//!
//! Branch, commit and push go through `git` itself (credentials, hooks and
//! remotes behave exactly as in the user's shell); the dirty-tree check reads
//! the index and working tree with `git2`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use git2::{Repository, Status, StatusOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::AutofixError;
use crate::runner::CommandRunner;

#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Name of the trunk branch.
    fn trunk(&self) -> &str;

    /// Check out the trunk, update it, and create `branch` from it.
    async fn start_branch(&self, branch: &str) -> Result<()>;

    /// Tracked modifications, staged changes or new non-ignored files.
    async fn has_changes(&self) -> Result<bool>;

    /// Stage everything and commit.
    async fn commit_all(&self, message: &str) -> Result<()>;

    async fn push(&self, branch: &str) -> Result<()>;

    /// Leave a branch that produced nothing: switch back to the trunk.
    async fn return_to_trunk(&self) -> Result<()>;

    /// Discard working-tree changes and force the trunk back out.
    async fn reset_to_trunk(&self) -> Result<()>;

    /// Force-delete a local branch that is not checked out.
    async fn delete_branch(&self, branch: &str) -> Result<()>;
}

/// A working tree driven through the `git` CLI.
pub struct GitRepo {
    workdir: PathBuf,
    trunk: String,
    remote: String,
    runner: Arc<dyn CommandRunner>,
}

impl GitRepo {
    pub fn new(
        workdir: impl Into<PathBuf>,
        trunk: impl Into<String>,
        remote: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            workdir: workdir.into(),
            trunk: trunk.into(),
            remote: remote.into(),
            runner,
        }
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        let output = self.runner.run("git", args, &self.workdir).await?;
        Ok(output.check("git", args)?.stdout)
    }
}

/// URL of `remote` in the repository at `workdir`, if it has one.
pub fn remote_url(workdir: &Path, remote: &str) -> Option<String> {
    let repo = Repository::open(workdir).ok()?;
    let remote = repo.find_remote(remote).ok()?;
    remote.url().map(str::to_string)
}

/// Whether the working tree at `workdir` differs from HEAD.
pub fn working_tree_dirty(workdir: &Path) -> Result<bool> {
    let repo = Repository::open(workdir).map_err(AutofixError::Git)?;
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .exclude_submodules(true);
    let statuses = repo.statuses(Some(&mut opts)).map_err(AutofixError::Git)?;
    Ok(statuses
        .iter()
        .any(|entry| !entry.status().is_empty() && !entry.status().contains(Status::IGNORED)))
}

#[async_trait]
impl VersionControl for GitRepo {
    fn trunk(&self) -> &str {
        &self.trunk
    }

    async fn start_branch(&self, branch: &str) -> Result<()> {
        self.git(&["checkout", &self.trunk]).await?;

        let pull = self
            .runner
            .run("git", &["pull", &self.remote, &self.trunk], &self.workdir)
            .await?;
        if !pull.is_success() {
            tracing::warn!(
                trunk = %self.trunk,
                stderr = %pull.stderr,
                "could not update trunk, branching from local state"
            );
        }

        self.git(&["checkout", "-b", branch])
            .await
            .with_context(|| format!("Failed to create branch {}", branch))?;
        Ok(())
    }

    async fn has_changes(&self) -> Result<bool> {
        let workdir = self.workdir.clone();
        tokio::task::spawn_blocking(move || working_tree_dirty(&workdir))
            .await
            .context("git status task panicked")?
    }

    async fn commit_all(&self, message: &str) -> Result<()> {
        self.git(&["add", "-A"]).await?;
        self.git(&["commit", "-m", message]).await?;
        Ok(())
    }

    async fn push(&self, branch: &str) -> Result<()> {
        self.git(&["push", &self.remote, branch])
            .await
            .with_context(|| format!("Failed to push branch {}", branch))?;
        Ok(())
    }

    async fn return_to_trunk(&self) -> Result<()> {
        self.git(&["checkout", &self.trunk]).await?;
        Ok(())
    }

    async fn reset_to_trunk(&self) -> Result<()> {
        self.git(&["reset", "--hard"]).await?;
        self.git(&["checkout", "-f", &self.trunk]).await?;
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        self.git(&["branch", "-D", branch])
            .await
            .with_context(|| format!("Failed to delete branch {}", branch))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixes::directive::DirectiveStrategy;
    use crate::fixes::{FixOutcome, Subject, Workflow};
    use crate::runner::{CommandOutput, ProcessRunner};
    use crate::testing::{RecordingPrs, ScriptedRunner, issue, test_config};
    use git2::{BranchType, RepositoryInitOptions};
    use std::fs;
    use tempfile::tempdir;

    fn init_repo(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "test").unwrap();
        config.set_str("user.email", "test@test.com").unwrap();
        drop(config);
        repo
    }

    fn commit_file(dir: &Path, name: &str, content: &str) {
        let repo = Repository::open(dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("test", "test@test.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, "commit", &tree, &parents)
            .unwrap();
    }

    fn git_repo(runner: Arc<ScriptedRunner>) -> GitRepo {
        GitRepo::new("/repo", "main", "origin", runner)
    }

    #[test]
    fn test_clean_tree_is_not_dirty() {
        let dir = tempdir().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), "a.ts", "export const a = 1;\n");
        assert!(!working_tree_dirty(dir.path()).unwrap());
    }

    #[test]
    fn test_modified_file_is_dirty() {
        let dir = tempdir().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), "a.ts", "export const a = 1;\n");
        fs::write(dir.path().join("a.ts"), "\"use client\";\n\nexport const a = 1;\n").unwrap();
        assert!(working_tree_dirty(dir.path()).unwrap());
    }

    #[test]
    fn test_new_untracked_file_is_dirty() {
        let dir = tempdir().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), "a.ts", "x\n");
        fs::write(dir.path().join(".env.example"), "DATABASE_URL=\n").unwrap();
        assert!(working_tree_dirty(dir.path()).unwrap());
    }

    #[test]
    fn test_ignored_file_is_not_dirty() {
        let dir = tempdir().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), ".gitignore", "node_modules/\n");
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/x.js"), "x").unwrap();
        assert!(!working_tree_dirty(dir.path()).unwrap());
    }

    #[test]
    fn test_remote_url_reads_origin() {
        let dir = tempdir().unwrap();
        let repo = init_repo(dir.path());
        repo.remote("origin", "git@github.com:owner/repo.git").unwrap();
        assert_eq!(
            remote_url(dir.path(), "origin").as_deref(),
            Some("git@github.com:owner/repo.git")
        );
        assert!(remote_url(dir.path(), "upstream").is_none());
    }

    #[tokio::test]
    async fn test_start_branch_runs_checkout_pull_branch() {
        let runner = Arc::new(ScriptedRunner::new());
        git_repo(runner.clone())
            .start_branch("auto-fix/docs-issue-1-20260101-000000")
            .await
            .unwrap();
        assert_eq!(
            runner.command_lines(),
            vec![
                "git checkout main",
                "git pull origin main",
                "git checkout -b auto-fix/docs-issue-1-20260101-000000",
            ]
        );
    }

    #[tokio::test]
    async fn test_start_branch_tolerates_failed_pull() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.respond_to("git pull origin main", CommandOutput::failure(1, "offline"));
        git_repo(runner.clone()).start_branch("b").await.unwrap();
        assert_eq!(runner.command_lines().len(), 3);
    }

    #[tokio::test]
    async fn test_start_branch_fails_when_branch_exists() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.respond_to(
            "git checkout -b b",
            CommandOutput::failure(128, "already exists"),
        );
        assert!(git_repo(runner).start_branch("b").await.is_err());
    }

    #[tokio::test]
    async fn test_commit_push_and_reset_commands() {
        let runner = Arc::new(ScriptedRunner::new());
        let repo = git_repo(runner.clone());
        repo.commit_all("docs: x (fixes #3)").await.unwrap();
        repo.push("b").await.unwrap();
        repo.reset_to_trunk().await.unwrap();
        repo.return_to_trunk().await.unwrap();
        repo.delete_branch("b").await.unwrap();
        assert_eq!(
            runner.command_lines(),
            vec![
                "git add -A",
                "git commit -m docs: x (fixes #3)",
                "git push origin b",
                "git reset --hard",
                "git checkout -f main",
                "git checkout main",
                "git branch -D b",
            ]
        );
    }

    #[test]
    fn test_status_outside_repository_is_git_error() {
        let dir = tempdir().unwrap();
        let err = working_tree_dirty(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AutofixError>(),
            Some(AutofixError::Git(_))
        ));
    }

    fn local_branches(dir: &Path) -> Vec<String> {
        let repo = Repository::open(dir).unwrap();
        repo.branches(Some(BranchType::Local))
            .unwrap()
            .map(|b| {
                let (branch, _) = b.unwrap();
                branch.name().unwrap().unwrap().to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_unchanged_attempt_leaves_only_trunk() {
        let dir = tempdir().unwrap();
        let repo =
            Repository::init_opts(dir.path(), RepositoryInitOptions::new().initial_head("main"))
                .unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "test").unwrap();
        config.set_str("user.email", "test@test.com").unwrap();
        drop(config);
        commit_file(dir.path(), "a.ts", "export const a = 1;\n");

        let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);
        let vcs = Arc::new(GitRepo::new(dir.path(), "main", "origin", runner.clone()));
        let workflow = Workflow::new(
            Arc::new(test_config(dir.path())),
            vcs,
            Arc::new(RecordingPrs::default()),
            runner,
        );
        let subject = issue(7, "Hooks break on the server");

        let outcome = workflow
            .attempt(&DirectiveStrategy, Subject::Issue(&subject))
            .await
            .unwrap();

        assert!(matches!(outcome, FixOutcome::NoChange { .. }));
        assert_eq!(local_branches(dir.path()), vec!["main"]);
        let repo = Repository::open(dir.path()).unwrap();
        assert_eq!(repo.head().unwrap().shorthand(), Some("main"));
    }
}
