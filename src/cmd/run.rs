//! `autofix run` and `autofix maintain`.

use anyhow::Result;
use std::sync::Arc;

use autofix::config::{AutofixConfig, ConfigOverrides, GitHubSettings};
use autofix::dispatch::{AttemptStatus, Dispatcher};
use autofix::fixes::Workflow;
use autofix::git::GitRepo;
use autofix::github::GitHubClient;
use autofix::orchestrator::{Orchestrator, run_maintenance};
use autofix::pull_request::GhCli;
use autofix::report;
use autofix::runner::{CommandRunner, ProcessRunner};
use autofix::ui;

/// Wire the real collaborators around `config`.
fn dispatcher(config: AutofixConfig) -> Dispatcher {
    let config = Arc::new(config);
    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);
    let vcs = Arc::new(GitRepo::new(
        config.workdir.clone(),
        config.trunk.clone(),
        config.remote.clone(),
        runner.clone(),
    ));
    let prs = Arc::new(GhCli::new(runner.clone(), config.workdir.clone()));
    Dispatcher::new(Workflow::new(config, vcs, prs, runner))
}

pub async fn cmd_run(overrides: &ConfigOverrides) -> Result<()> {
    let config = AutofixConfig::load(overrides)?;
    let github = GitHubSettings::resolve(&config, overrides)?;
    ui::print_header(Some(github.repo.as_str()), config.max_fixes, config.dry_run);

    let output_file = config.output_file.clone();
    let mut client = GitHubClient::new(github.token, github.repo);
    if let Some(api_url) = github.api_url {
        client = client.with_api_url(api_url);
    }
    let tracker = Arc::new(client);
    let summary = Orchestrator::new(tracker, dispatcher(config)).run().await;

    report::publish(&summary, output_file.as_deref());
    Ok(())
}

pub async fn cmd_maintain(overrides: &ConfigOverrides) -> Result<()> {
    let config = AutofixConfig::load(overrides)?;
    ui::print_header(None, config.max_fixes, config.dry_run);

    // A failed pass was already reported; it does not change the exit status.
    if let AttemptStatus::Fixed { pull_request } = run_maintenance(&dispatcher(config)).await {
        tracing::info!(pull_request = ?pull_request, "maintenance committed");
    }
    Ok(())
}
