//! Symbol resolution and commit selection.

use anyhow::Result;

use super::types::{LandCommit, Symbol};
use super::GitLandEngine;
use crate::error::LandError;

impl GitLandEngine {
    /// When the user names nothing, land the branch they are standing on, or
    /// the bare HEAD commit on a detached HEAD.
    pub(super) fn get_default_symbols(&self) -> Result<Vec<String>> {
        match self.repo.current_branch()? {
            Some(branch) => Ok(vec![branch]),
            None => Ok(vec![self.repo.head_commit()?]),
        }
    }

    pub(super) fn do_resolve_symbols(&self, symbols: &mut [Symbol]) -> Result<()> {
        for symbol in symbols {
            let commit = self.repo.resolve_ref_opt(symbol.raw())?.ok_or_else(|| {
                LandError::config(format!(
                    "Symbol \"{}\" does not identify a commit in the local working copy.",
                    symbol.raw()
                ))
            })?;
            symbol.set_commit(commit);
        }
        Ok(())
    }

    /// Every commit reachable from the symbols but not from the integration
    /// target, deduplicated across symbols. Commits are grouped per symbol
    /// in input order, oldest first within each group, so each symbol's own
    /// tip is the last new commit its group contributes. A commit's direct
    /// symbols are the symbols whose resolution is exactly that commit; its
    /// indirect symbols are every symbol it is reachable from.
    pub(super) fn collect_commits(
        &mut self,
        into: Option<&str>,
        symbols: &[Symbol],
    ) -> Result<Vec<LandCommit>> {
        let mut commits: Vec<LandCommit> = Vec::new();

        for symbol in symbols {
            let symbol_commit = symbol.commit()?;
            let log = self.repo.commit_log_lines(symbol_commit, into)?;
            let segment_start = commits.len();

            for line in log.lines() {
                if line.is_empty() {
                    continue;
                }
                let mut fields = line.split('\0');
                let (hash, parents, summary) =
                    match (fields.next(), fields.next(), fields.next()) {
                        (Some(hash), Some(parents), Some(summary)) => (hash, parents, summary),
                        _ => {
                            return Err(LandError::internal(format!(
                                "unexpected commit log line: {:?}",
                                line
                            )))
                        }
                    };

                let index = match commits.iter().position(|c| c.hash == hash) {
                    Some(index) => index,
                    None => {
                        commits.push(LandCommit {
                            hash: hash.to_string(),
                            parents: parents.split_whitespace().map(String::from).collect(),
                            summary: summary.to_string(),
                            direct_symbols: Vec::new(),
                            indirect_symbols: Vec::new(),
                        });
                        commits.len() - 1
                    }
                };
                let commit = &mut commits[index];

                if hash == symbol_commit {
                    if !commit.direct_symbols.iter().any(|s| s == symbol.raw()) {
                        commit.direct_symbols.push(symbol.raw().to_string());
                    }
                }
                if !commit.indirect_symbols.iter().any(|s| s == symbol.raw()) {
                    commit.indirect_symbols.push(symbol.raw().to_string());
                }
            }

            // git log emits newest first; landing reads oldest first.
            commits[segment_start..].reverse();
        }

        Ok(commits)
    }
}
