//! External process execution.
//!
//! Everything the tool shells out to (git, npm, gh) goes through
//! [`CommandRunner`], so the fix workflow can be driven by a recording fake in
//! tests.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::errors::AutofixError;

/// Captured result of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Convert a non-zero exit into [`AutofixError::CommandFailed`].
    pub fn check(self, program: &str, args: &[&str]) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(AutofixError::CommandFailed {
            command: display_command(program, args),
            code: self.code,
            stderr: self.stderr.trim().to_string(),
        }
        .into())
    }
}

/// Render a command line for logs and error messages.
pub fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Abstraction over process execution for testability.
/// Real implementation: `ProcessRunner`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` in `cwd` and capture its output.
    ///
    /// Only a failure to spawn is an error; a non-zero exit is reported
    /// through [`CommandOutput::code`].
    async fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<CommandOutput>;
}

/// Runs commands as child processes, waiting for each to finish.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<CommandOutput> {
        tracing::debug!(command = %display_command(program, args), cwd = %cwd.display(), "running");

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| AutofixError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
