//! In-memory collaborators for unit tests.

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use walkdir::WalkDir;

use crate::config::{AutofixConfig, AutofixToml, ConfigOverrides};
use crate::fixes::Workflow;
use crate::git::VersionControl;
use crate::github::{Issue, IssueTracker};
use crate::pull_request::{NewPullRequest, PullRequestCreator};
use crate::runner::{CommandOutput, CommandRunner, display_command};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

type Effect = Box<dyn Fn(&Path) + Send + Sync>;

/// Records every command and answers from a script.
///
/// Lookup order: exact command line, then program name, then `success("")`.
#[derive(Default)]
pub struct ScriptedRunner {
    by_line: Mutex<HashMap<String, CommandOutput>>,
    by_program: Mutex<HashMap<String, CommandOutput>>,
    effects: Mutex<HashMap<String, Effect>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, program: &str, output: CommandOutput) {
        self.by_program
            .lock()
            .unwrap()
            .insert(program.to_string(), output);
    }

    pub fn respond_to(&self, command_line: &str, output: CommandOutput) {
        self.by_line
            .lock()
            .unwrap()
            .insert(command_line.to_string(), output);
    }

    /// Run `effect` in the command's cwd whenever `command_line` is invoked.
    pub fn on(&self, command_line: &str, effect: impl Fn(&Path) + Send + Sync + 'static) {
        self.effects
            .lock()
            .unwrap()
            .insert(command_line.to_string(), Box::new(effect));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| {
                let args: Vec<&str> = c.args.iter().map(String::as_str).collect();
                display_command(&c.program, &args)
            })
            .collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<CommandOutput> {
        let line = display_command(program, args);
        self.calls.lock().unwrap().push(RecordedCall {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: cwd.to_path_buf(),
        });
        if let Some(effect) = self.effects.lock().unwrap().get(&line) {
            effect(cwd);
        }
        if let Some(out) = self.by_line.lock().unwrap().get(&line) {
            return Ok(out.clone());
        }
        if let Some(out) = self.by_program.lock().unwrap().get(program) {
            return Ok(out.clone());
        }
        Ok(CommandOutput::success(""))
    }
}

type Snapshot = BTreeMap<PathBuf, Vec<u8>>;

fn snapshot(root: &Path) -> Snapshot {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let content = std::fs::read(e.path()).unwrap();
            (e.path().to_path_buf(), content)
        })
        .collect()
}

fn restore(root: &Path, trunk: &Snapshot) {
    for path in snapshot(root).keys() {
        if !trunk.contains_key(path) {
            std::fs::remove_file(path).unwrap();
        }
    }
    for (path, content) in trunk {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}

/// A version-control fake over a plain directory.
///
/// The tree as first seen by `start_branch` is the trunk; checking the
/// trunk out again (on the next `start_branch` or a reset) restores it, so
/// committed branch work disappears from the tree just as with real git.
pub struct FakeVcs {
    root: PathBuf,
    trunk_files: Mutex<Option<Snapshot>>,
    current: Mutex<String>,
    branches: Mutex<Vec<String>>,
    commits: Mutex<Vec<String>>,
    pushes: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    resets: Mutex<usize>,
    fail_push: bool,
}

impl FakeVcs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            trunk_files: Mutex::new(None),
            current: Mutex::new("main".to_string()),
            branches: Mutex::new(Vec::new()),
            commits: Mutex::new(Vec::new()),
            pushes: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            resets: Mutex::new(0),
            fail_push: false,
        }
    }

    pub fn failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    pub fn current_branch(&self) -> String {
        self.current.lock().unwrap().clone()
    }

    pub fn branches(&self) -> Vec<String> {
        self.branches.lock().unwrap().clone()
    }

    /// Created branches that were not deleted since.
    pub fn live_branches(&self) -> Vec<String> {
        let deleted = self.deleted.lock().unwrap();
        self.branches()
            .into_iter()
            .filter(|b| !deleted.contains(b))
            .collect()
    }

    pub fn commits(&self) -> Vec<String> {
        self.commits.lock().unwrap().clone()
    }

    pub fn pushes(&self) -> Vec<String> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn resets(&self) -> usize {
        *self.resets.lock().unwrap()
    }

    fn checkout_trunk(&self) {
        let mut trunk = self.trunk_files.lock().unwrap();
        let files = trunk.get_or_insert_with(|| snapshot(&self.root));
        restore(&self.root, files);
        *self.current.lock().unwrap() = "main".to_string();
    }
}

#[async_trait]
impl VersionControl for FakeVcs {
    fn trunk(&self) -> &str {
        "main"
    }

    async fn start_branch(&self, branch: &str) -> Result<()> {
        self.checkout_trunk();
        self.branches.lock().unwrap().push(branch.to_string());
        *self.current.lock().unwrap() = branch.to_string();
        Ok(())
    }

    async fn has_changes(&self) -> Result<bool> {
        let trunk = self.trunk_files.lock().unwrap();
        Ok(trunk.as_ref() != Some(&snapshot(&self.root)))
    }

    async fn commit_all(&self, message: &str) -> Result<()> {
        self.commits.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn push(&self, branch: &str) -> Result<()> {
        if self.fail_push {
            bail!("push rejected for {}", branch);
        }
        self.pushes.lock().unwrap().push(branch.to_string());
        Ok(())
    }

    async fn return_to_trunk(&self) -> Result<()> {
        self.checkout_trunk();
        Ok(())
    }

    async fn reset_to_trunk(&self) -> Result<()> {
        *self.resets.lock().unwrap() += 1;
        self.checkout_trunk();
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        if *self.current.lock().unwrap() == branch {
            bail!("cannot delete branch '{}' checked out", branch);
        }
        if !self.branches.lock().unwrap().iter().any(|b| b == branch) {
            bail!("branch '{}' not found", branch);
        }
        self.deleted.lock().unwrap().push(branch.to_string());
        Ok(())
    }
}

/// Issue tracker fake holding a fixed listing.
#[derive(Default)]
pub struct FakeTracker {
    issues: Vec<Issue>,
    fail_listing: bool,
    fail_comments: bool,
    comments: Mutex<Vec<(u64, String)>>,
}

impl FakeTracker {
    pub fn with_issues(issues: Vec<Issue>) -> Self {
        Self {
            issues,
            ..Self::default()
        }
    }

    pub fn failing_listing() -> Self {
        Self {
            fail_listing: true,
            ..Self::default()
        }
    }

    pub fn failing_comments(mut self) -> Self {
        self.fail_comments = true;
        self
    }

    pub fn comments(&self) -> Vec<(u64, String)> {
        self.comments.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn list_open_issues(&self) -> Result<Vec<Issue>> {
        if self.fail_listing {
            bail!("GitHub API error (503): unavailable");
        }
        Ok(self.issues.clone())
    }

    async fn comment(&self, issue_number: u64, body: &str) -> Result<()> {
        if self.fail_comments {
            bail!("GitHub API error (403): forbidden");
        }
        self.comments
            .lock()
            .unwrap()
            .push((issue_number, body.to_string()));
        Ok(())
    }
}

/// Pull request creator that numbers requests in order.
#[derive(Default)]
pub struct RecordingPrs {
    requests: Mutex<Vec<NewPullRequest>>,
}

impl RecordingPrs {
    pub fn requests(&self) -> Vec<NewPullRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PullRequestCreator for RecordingPrs {
    async fn create(&self, request: &NewPullRequest) -> Result<String> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        Ok(format!("https://github.com/o/r/pull/{}", requests.len()))
    }
}

/// An issue with no body or labels.
pub fn issue(number: u64, title: &str) -> Issue {
    Issue {
        number,
        title: title.to_string(),
        body: None,
        labels: Vec::new(),
        is_pull_request: false,
    }
}

/// Default settings rooted at `workdir`.
pub fn test_config(workdir: &Path) -> AutofixConfig {
    AutofixConfig::from_layers(
        AutofixToml::default(),
        &ConfigOverrides {
            workdir: workdir.to_path_buf(),
            ..ConfigOverrides::default()
        },
    )
}

/// Fakes wired into a [`Workflow`], kept around for assertions.
pub struct Harness {
    pub vcs: Arc<FakeVcs>,
    pub prs: Arc<RecordingPrs>,
    pub runner: Arc<ScriptedRunner>,
}

impl Harness {
    pub fn new(workdir: &Path) -> Self {
        Self {
            vcs: Arc::new(FakeVcs::new(workdir)),
            prs: Arc::new(RecordingPrs::default()),
            runner: Arc::new(ScriptedRunner::new()),
        }
    }

    pub fn with_vcs(mut self, vcs: FakeVcs) -> Self {
        self.vcs = Arc::new(vcs);
        self
    }

    pub fn workflow(&self, config: AutofixConfig) -> Workflow {
        Workflow::new(
            Arc::new(config),
            self.vcs.clone(),
            self.prs.clone(),
            self.runner.clone(),
        )
    }
}
