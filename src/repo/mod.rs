//! Git repository gateway for runway.
//!
//! `Repository` is the semantic layer over the subprocess transport in
//! `exec`: it knows what the land engine needs from git (ref resolution,
//! checkout, merge, diff, raw commit surgery, remote queries) but not why.
//!
//! # Operations
//!
//! - **Ref resolution**: resolve refs with an explicit `Option` for "absent"
//! - **Working copy**: checkout, hard reset, branch force/delete, stash
//! - **Integration**: merge, merge-abort, commit with explicit author/date
//! - **Ref enumeration**: points-at and contains queries (`refs.rs`)
//! - **Raw commits**: parent-list rewriting for empty-target landing
//!   (`raw_commit.rs`)
//! - **Remotes**: pushability/fetchability/perforce queries, fetch/push with
//!   credential passthrough (`remote.rs`)
//! - **Tracking**: upstream path resolution with cycle detection
//!   (`upstream.rs`)

mod raw_commit;
pub mod refs;
mod remote;
mod upstream;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::exec::{ExecOutcome, GitRunner};

pub use raw_commit::RawCommit;
pub use refs::RefQuery;
pub use upstream::UpstreamPath;

/// A git working copy, addressed through the git CLI.
pub struct Repository {
    runner: GitRunner,
    git_dir: PathBuf,
    workdir: PathBuf,
}

impl Repository {
    /// Open the repository containing the current directory.
    pub fn discover() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Self::from_path(&cwd)
    }

    /// Open the repository containing `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let probe = GitRunner::new(path);

        let outcome = probe.run(&["rev-parse", "--git-dir"])?;
        if !outcome.success() {
            anyhow::bail!("Not a git repository: {}", path.display());
        }
        let git_dir_str = outcome.stdout.trim().to_string();
        let git_dir = if Path::new(&git_dir_str).is_absolute() {
            PathBuf::from(git_dir_str)
        } else {
            path.join(git_dir_str)
        };

        let outcome = probe.run(&["rev-parse", "--show-toplevel"])?;
        if !outcome.success() {
            anyhow::bail!("Not a git working tree: {}", path.display());
        }
        let workdir = PathBuf::from(outcome.stdout.trim());

        Ok(Self {
            runner: GitRunner::new(&workdir),
            git_dir,
            workdir,
        })
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub(crate) fn runner(&self) -> &GitRunner {
        &self.runner
    }

    // =========================================================================
    // Ref resolution
    // =========================================================================

    /// Resolve a ref to a commit hash, or `None` if it does not exist.
    pub fn resolve_ref_opt(&self, reference: &str) -> Result<Option<String>> {
        let outcome = self.runner.run(&["rev-parse", "--verify", reference])?;
        if outcome.success() {
            Ok(Some(outcome.stdout.trim().to_string()))
        } else {
            Ok(None)
        }
    }

    /// Resolve a ref to a commit hash, failing if it does not exist.
    pub fn resolve_ref(&self, reference: &str) -> Result<String> {
        self.resolve_ref_opt(reference)?
            .with_context(|| format!("Ref \"{}\" does not exist", reference))
    }

    /// Get the current branch name, or `None` if HEAD is detached.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let outcome = self.runner.run(&["symbolic-ref", "--short", "HEAD"])?;
        if outcome.success() {
            Ok(Some(outcome.stdout.trim().to_string()))
        } else {
            Ok(None)
        }
    }

    /// Resolve HEAD to a commit hash.
    pub fn head_commit(&self) -> Result<String> {
        self.resolve_ref("HEAD")
    }

    /// Read a git config value, or `None` if unset.
    pub fn config_get(&self, key: &str) -> Result<Option<String>> {
        let outcome = self.runner.run(&["config", "--get", key])?;
        if outcome.success() {
            Ok(Some(outcome.stdout.trim().to_string()))
        } else {
            Ok(None)
        }
    }

    // =========================================================================
    // Working copy operations
    // =========================================================================

    /// Check out a commit or branch.
    pub fn checkout(&self, commitish: &str) -> Result<()> {
        self.runner.run_checked(&["checkout", commitish, "--"])?;
        Ok(())
    }

    /// Hard-reset the working copy to a commit.
    pub fn reset_hard(&self, commitish: &str) -> Result<()> {
        self.runner.run_checked(&["reset", "--hard", commitish, "--"])?;
        Ok(())
    }

    /// Force-update a branch to point at a commit.
    pub fn force_branch(&self, name: &str, commit: &str) -> Result<()> {
        self.runner.run_checked(&["branch", "-f", name, commit, "--"])?;
        Ok(())
    }

    /// Delete a branch, even if unmerged.
    pub fn delete_branch(&self, name: &str) -> Result<()> {
        self.runner.run_checked(&["branch", "-D", "--", name])?;
        Ok(())
    }

    /// Attempt a merge. A non-zero exit (conflict) is reported in the
    /// outcome so the caller can run the explicit rollback sequence.
    pub fn merge(&self, args: &[&str]) -> Result<ExecOutcome> {
        let mut argv = vec!["merge"];
        argv.extend_from_slice(args);
        self.runner.run(&argv)
    }

    /// Abort an in-progress merge and reset the working copy. Used as the
    /// rollback step after a failed integration; failures here are ignored
    /// because there may be no merge in progress to abort.
    pub fn abort_merge_and_reset(&self) -> Result<()> {
        let _ = self.runner.run(&["merge", "--abort"])?;
        let _ = self.runner.run(&["reset", "--hard", "HEAD", "--"])?;
        Ok(())
    }

    /// Run a rebase of `branch` from `from` onto `onto`, reporting conflicts
    /// in the outcome.
    pub fn rebase_onto(&self, onto: &str, from: &str, branch: &str) -> Result<ExecOutcome> {
        self.runner.run(&["rebase", "--onto", onto, "--", from, branch])
    }

    /// Abort an in-progress rebase. Best-effort.
    pub fn abort_rebase(&self) -> Result<()> {
        let _ = self.runner.run(&["rebase", "--abort"])?;
        Ok(())
    }

    // =========================================================================
    // Commit operations
    // =========================================================================

    /// Compute the textual diff between two commits.
    pub fn diff_text(&self, from: &str, to: &str) -> Result<String> {
        let range = format!("{}..{}", from, to);
        self.runner.run_checked(&["diff", "--no-ext-diff", &range, "--"])
    }

    /// Commit staged changes with an explicit author identity and date. The
    /// message is passed on stdin so it survives shells and newlines intact.
    pub fn commit_with_author(&self, author: &str, date: &str, message: &str) -> Result<()> {
        let outcome = self.runner.run_with_stdin(
            &["commit", "--author", author, "--date", date, "-F", "-", "--"],
            message.as_bytes(),
        )?;
        if !outcome.success() {
            anyhow::bail!("git commit failed: {}", outcome.stderr.trim());
        }
        Ok(())
    }

    /// Get the author identity ("Name <email>") and authored date of a commit.
    pub fn author_and_date(&self, commit: &str) -> Result<(String, String)> {
        let info = self
            .runner
            .run_checked(&["log", "-n1", "--format=%aD%n%an%n%ae", commit, "--"])?;
        let mut lines = info.lines();
        let date = lines.next().unwrap_or_default().to_string();
        let name = lines.next().unwrap_or_default().to_string();
        let email = lines.next().unwrap_or_default().to_string();
        Ok((format!("{} <{}>", name, email), date))
    }

    /// History of `tip`, optionally excluding everything reachable from
    /// `not`, as NUL-delimited `hash / parents / summary` records.
    pub fn commit_log_lines(&self, tip: &str, not: Option<&str>) -> Result<String> {
        let format = "--format=%H%x00%P%x00%s%x00";
        match not {
            Some(not) => self.runner.run_checked(&["log", tip, "--not", not, format]),
            None => self.runner.run_checked(&["log", tip, format]),
        }
    }

    /// Check whether `branch` is an ancestor of `commit`:
    /// merge-base(branch, commit) == branch.
    ///
    /// Unrelated histories (no merge base) count as "not an ancestor".
    pub fn is_ancestor_of(&self, branch: &str, commit: &str) -> Result<bool> {
        let outcome = self.runner.run(&["merge-base", branch, commit])?;
        if !outcome.success() {
            return Ok(false);
        }
        let merge_base = outcome.stdout.trim().to_string();
        let branch_hash = self.resolve_ref(branch)?;
        Ok(merge_base == branch_hash)
    }

    // =========================================================================
    // Status / stash
    // =========================================================================

    /// Check for any uncommitted changes (staged, unstaged, or untracked).
    pub fn has_uncommitted_changes(&self) -> Result<bool> {
        let output = self.runner.run_checked(&["status", "--porcelain"])?;
        Ok(!output.is_empty())
    }

    /// Stash the working copy, including untracked files.
    pub fn stash_push(&self, label: &str) -> Result<()> {
        self.runner
            .run_checked(&["stash", "push", "--include-untracked", "-m", label])?;
        Ok(())
    }

    /// Pop the most recent stash entry.
    pub fn stash_pop(&self) -> Result<()> {
        self.runner.run_checked(&["stash", "pop"])?;
        Ok(())
    }
}
