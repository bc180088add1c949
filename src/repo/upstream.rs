//! Upstream tracking-path resolution.
//!
//! Git encodes tracking with `branch.<name>.remote` and `branch.<name>.merge`.
//! A remote of "." is a local tracking link to another local branch; anything
//! else terminates the chain at a remote branch. Following local links can
//! loop, so the walk carries a visited set and reports the cycle it found.

use anyhow::Result;
use std::collections::HashSet;

use super::Repository;

/// The chain of tracking links starting at one local branch.
#[derive(Debug, Clone, Default)]
pub struct UpstreamPath {
    /// Local branches along the chain, starting branch first.
    local_branches: Vec<String>,
    /// Remote name and remote branch name, if the chain reaches a remote.
    remote: Option<(String, String)>,
    /// The repeating chain, if following the links loops.
    cycle: Option<Vec<String>>,
    /// Number of tracking links followed.
    length: usize,
}

impl UpstreamPath {
    /// Local branches along the chain, starting branch first.
    pub fn local_branches(&self) -> &[String] {
        &self.local_branches
    }

    pub fn is_connected_to_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn remote_name(&self) -> Option<&str> {
        self.remote.as_ref().map(|(remote, _)| remote.as_str())
    }

    pub fn remote_branch_name(&self) -> Option<&str> {
        self.remote.as_ref().map(|(_, branch)| branch.as_str())
    }

    /// The looping chain of branch names, if one was found.
    pub fn cycle(&self) -> Option<&[String]> {
        self.cycle.as_deref()
    }

    /// Number of tracking links followed; zero means the branch tracks
    /// nothing at all.
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Repository {
    /// Follow tracking links from `branch` until they reach a remote, run
    /// out, or loop.
    pub fn upstream_path(&self, branch: &str) -> Result<UpstreamPath> {
        let mut path = UpstreamPath {
            local_branches: vec![branch.to_string()],
            ..Default::default()
        };

        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(branch.to_string());

        let mut cursor = branch.to_string();
        loop {
            let remote = self.config_get(&format!("branch.{}.remote", cursor))?;
            let merge = self.config_get(&format!("branch.{}.merge", cursor))?;

            let (remote, merge) = match (remote, merge) {
                (Some(remote), Some(merge)) if !remote.is_empty() && !merge.is_empty() => {
                    (remote, merge)
                }
                _ => break,
            };

            let upstream = merge
                .strip_prefix("refs/heads/")
                .unwrap_or(merge.as_str())
                .to_string();

            path.length += 1;

            if remote != "." {
                path.remote = Some((remote, upstream));
                break;
            }

            if !seen.insert(upstream.clone()) {
                let mut chain = path.local_branches.clone();
                chain.push(upstream);
                path.cycle = Some(chain);
                break;
            }

            path.local_branches.push(upstream.clone());
            cursor = upstream;
        }

        Ok(path)
    }
}
