//! Subprocess execution for git commands.
//!
//! Every git invocation in runway goes through `GitRunner`. Outcomes are
//! explicit values (`ExecOutcome`), not panics or unwinding: callers decide
//! whether a non-zero exit is an error, a rollback trigger, or expected.
//!
//! Network-touching commands (fetch, push, `git p4` sync/submit) must use
//! `passthru` rather than `run`: they may prompt the user for credentials,
//! so their stdio is inherited from the invoking terminal.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::context::ExecutionContext;

/// Log a git command if verbose mode is enabled
pub(crate) fn verbose_cmd(args: &[&str]) {
    if ExecutionContext::is_verbose() {
        eprintln!("  {} git {}", "[cmd]".dimmed(), args.join(" "));
    }
}

/// Result of a captured git invocation.
///
/// A non-zero exit status is not an error at this layer; `run_checked` is the
/// convenience path for callers that want one.
#[derive(Debug, Clone)]
pub struct ExecOutcome {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutcome {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    fn from_output(output: std::process::Output) -> Self {
        Self {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Runs git subprocesses in a fixed working directory.
pub struct GitRunner {
    workdir: PathBuf,
}

impl GitRunner {
    pub fn new(workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.workdir);
        cmd
    }

    /// Run a git command, capturing output. Non-zero exit is reported in the
    /// outcome, not as an error.
    pub fn run(&self, args: &[&str]) -> Result<ExecOutcome> {
        verbose_cmd(args);
        let output = self
            .command(args)
            .output()
            .with_context(|| format!("Failed to run git {}", args.join(" ")))?;
        Ok(ExecOutcome::from_output(output))
    }

    /// Run a git command and fail with its stderr if it exits non-zero.
    /// Returns trimmed stdout.
    pub fn run_checked(&self, args: &[&str]) -> Result<String> {
        let outcome = self.run(args)?;
        if !outcome.success() {
            anyhow::bail!("git {} failed: {}", args.join(" "), outcome.stderr.trim());
        }
        Ok(outcome.stdout.trim().to_string())
    }

    /// Run a git command with bytes written to its stdin, capturing output.
    pub fn run_with_stdin(&self, args: &[&str], input: &[u8]) -> Result<ExecOutcome> {
        verbose_cmd(args);
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn git {}", args.join(" ")))?;

        child
            .stdin
            .as_mut()
            .context("Failed to open child stdin")?
            .write_all(input)
            .context("Failed to write to child stdin")?;

        let output = child.wait_with_output()?;
        Ok(ExecOutcome::from_output(output))
    }

    /// Run a git command with inherited stdio so it can interact with the
    /// terminal (credential prompts during fetch/push). Returns whether the
    /// command succeeded.
    pub fn passthru(&self, args: &[&str]) -> Result<bool> {
        verbose_cmd(args);
        let status = self
            .command(args)
            .status()
            .with_context(|| format!("Failed to run git {}", args.join(" ")))?;
        Ok(status.success())
    }
}
