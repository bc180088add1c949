//! Core value types for the land engine.

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::LandError;

/// How a commit set is integrated into the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Collapse the commit set into a single new commit (default)
    Squash,
    /// Create a standard multi-parent merge commit
    Merge,
}

impl Strategy {
    pub fn is_squash(self) -> bool {
        matches!(self, Strategy::Squash)
    }
}

/// A user-supplied reference to be landed: a branch name or commit-ish
/// string, plus the concrete commit it resolves to.
///
/// The raw string is never inspected for shape; resolution is the only way a
/// symbol gains meaning.
#[derive(Debug, Clone)]
pub struct Symbol {
    raw: String,
    commit: Option<String>,
}

impl Symbol {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            commit: None,
        }
    }

    /// The string the user typed.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Record the concrete commit this symbol resolves to.
    pub fn set_commit(&mut self, commit: String) {
        self.commit = Some(commit);
    }

    /// The resolved commit hash. Resolution happens once, up front; asking
    /// before then is a pipeline sequencing bug.
    pub fn commit(&self) -> Result<&str> {
        self.commit.as_deref().ok_or_else(|| {
            LandError::internal(format!("symbol \"{}\" was never resolved", self.raw))
        })
    }
}

/// One commit selected for landing, with the symbols that led to it.
#[derive(Debug, Clone)]
pub struct LandCommit {
    pub hash: String,
    /// Parent hashes, in commit order.
    pub parents: Vec<String>,
    /// One-line summary for display.
    pub summary: String,
    /// Symbols that named this commit directly (first symbol to reach it).
    pub direct_symbols: Vec<String>,
    /// Every symbol this commit is reachable from.
    pub indirect_symbols: Vec<String>,
}

impl LandCommit {
    /// Short hash for display.
    pub fn display_hash(&self) -> &str {
        display_hash(&self.hash)
    }
}

/// Short form of a commit hash for display.
pub fn display_hash(hash: &str) -> &str {
    &hash[..12.min(hash.len())]
}

/// An ordered group of commits integrated together, newest last, with the
/// authoritative commit message for the integration commit.
#[derive(Debug, Clone)]
pub struct CommitSet {
    commits: Vec<LandCommit>,
    message: String,
}

impl CommitSet {
    /// A commit set is never empty.
    pub fn new(commits: Vec<LandCommit>, message: String) -> Result<Self> {
        if commits.is_empty() {
            return Err(LandError::internal("refusing to build an empty commit set"));
        }
        Ok(Self { commits, message })
    }

    pub fn commits(&self) -> &[LandCommit] {
        &self.commits
    }

    /// The newest commit in the set: the tip that will be merged.
    pub fn newest(&self) -> &LandCommit {
        // Non-emptiness is enforced at construction.
        self.commits.last().expect("commit set is never empty")
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A (remote, ref) pair naming a fetch/publish destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandTarget {
    pub remote: String,
    pub ref_name: String,
}

impl LandTarget {
    pub fn new(remote: impl Into<String>, ref_name: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            ref_name: ref_name.into(),
        }
    }

    /// Cache key for memoized target resolution.
    pub fn key(&self) -> String {
        format!("{}/{}", self.remote, self.ref_name)
    }
}
