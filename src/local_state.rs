//! Working-copy snapshot taken before the land operation begins.
//!
//! Captures the starting branch (if any), its upstream tracking path, the
//! starting HEAD commit, and a stash of uncommitted edits. Reconciliation
//! either restores this state exactly or discards the bookkeeping; discarding
//! still reapplies any stashed edits wherever the pipeline ended up, so user
//! work is never silently dropped.

use anyhow::Result;

use crate::repo::{Repository, UpstreamPath};

const STASH_LABEL: &str = "runway: automatic stash before landing";

/// Snapshot of the working copy at the start of a land run.
pub struct LocalState {
    local_ref: Option<String>,
    local_path: UpstreamPath,
    head_commit: String,
    stashed: bool,
}

impl LocalState {
    /// Record the current branch and HEAD, stashing uncommitted edits.
    pub fn save(repo: &Repository) -> Result<Self> {
        let local_ref = repo.current_branch()?;
        let head_commit = repo.head_commit()?;

        let local_path = match &local_ref {
            Some(branch) => repo.upstream_path(branch)?,
            None => UpstreamPath::default(),
        };

        let stashed = repo.has_uncommitted_changes()?;
        if stashed {
            repo.stash_push(STASH_LABEL)?;
        }

        Ok(Self {
            local_ref,
            local_path,
            head_commit,
            stashed,
        })
    }

    /// The branch the user started on, if HEAD was not detached.
    pub fn local_ref(&self) -> Option<&str> {
        self.local_ref.as_deref()
    }

    /// Local branches along the starting branch's tracking chain.
    pub fn local_branches(&self) -> &[String] {
        self.local_path.local_branches()
    }

    /// Put the working copy back exactly as it was: original branch or
    /// detached commit, stashed edits reapplied.
    pub fn restore(self, repo: &Repository) -> Result<()> {
        match &self.local_ref {
            Some(branch) => repo.checkout(branch)?,
            None => repo.checkout(&self.head_commit)?,
        }
        if self.stashed {
            repo.stash_pop()?;
        }
        Ok(())
    }

    /// Drop the snapshot without moving the working copy, reapplying any
    /// stashed edits in place.
    pub fn discard(self, repo: &Repository) -> Result<()> {
        if self.stashed {
            repo.stash_pop()?;
        }
        Ok(())
    }

    /// Copy-pasteable commands that would undo the operation's local effects,
    /// for display when changes are held.
    pub fn restore_commands(&self) -> Vec<String> {
        let mut commands = Vec::new();
        match &self.local_ref {
            Some(branch) => commands.push(format!("git checkout {}", branch)),
            None => commands.push(format!("git checkout {}", self.head_commit)),
        }
        if self.stashed {
            commands.push("git stash pop".to_string());
        }
        commands
    }
}
