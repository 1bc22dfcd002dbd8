//! Run summary and automation outputs.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::dispatch::{AttemptStatus, FixAttempt};

/// What one orchestrated run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub max_fixes: usize,
    pub attempts: Vec<FixAttempt>,
    /// Set only when the maintenance pass ran.
    pub maintenance: Option<AttemptStatus>,
    /// The issue list could not be fetched.
    pub listing_failed: bool,
}

impl RunSummary {
    pub fn new(max_fixes: usize) -> Self {
        Self {
            max_fixes,
            ..Self::default()
        }
    }

    pub fn fixes_applied(&self) -> usize {
        self.attempts.iter().filter(|a| a.is_fixed()).count()
    }

    pub fn failures(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.status, AttemptStatus::Failed(_)))
            .count()
    }

    /// Whether any fix, including a maintenance pass, was committed.
    pub fn pr_created(&self) -> bool {
        self.fixes_applied() > 0 || matches!(self.maintenance, Some(AttemptStatus::Fixed { .. }))
    }

    /// `key=value` lines for the automation output file.
    pub fn output_lines(&self) -> String {
        format!(
            "pr_created={}\nfixes_applied={}\n",
            self.pr_created(),
            self.fixes_applied()
        )
    }
}

/// Append the summary outputs to `path`, creating it if needed.
pub fn write_outputs(path: &Path, summary: &RunSummary) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open output file: {}", path.display()))?;
    file.write_all(summary.output_lines().as_bytes())
        .with_context(|| format!("Failed to write output file: {}", path.display()))?;
    Ok(())
}

/// Print the closing summary and write outputs when a file is configured.
/// A failed write is logged; the run itself already happened.
pub fn publish(summary: &RunSummary, output_file: Option<&Path>) {
    crate::ui::print_summary(
        summary.fixes_applied(),
        summary.max_fixes,
        summary.failures(),
    );
    if let Some(path) = output_file
        && let Err(err) = write_outputs(path, summary)
    {
        tracing::warn!(error = %format!("{:#}", err), "failed to write run outputs");
    }
}
