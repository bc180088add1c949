//! Final reconciliation: decide where the working copy should end up after a
//! successful land, and fast-forward surviving local branches that the landed
//! state has made ancestors.
//!
//! Reconciliation is conservative. It only ever force-updates a branch whose
//! head is an ancestor of the landed commit; anything with divergent work is
//! left alone. When nothing reasonable survives, HEAD is left detached at the
//! landed commit and the user is told so.

use anyhow::Result;

use super::types::display_hash;
use super::GitLandEngine;
use crate::local_state::LocalState;
use crate::ui::output;

impl GitLandEngine {
    pub(super) fn reconcile_local_state(
        &mut self,
        into_commit: &str,
        state: LocalState,
    ) -> Result<()> {
        // A user who started detached gets left wherever the pipeline ended.
        if state.local_ref().is_none() {
            output::status(
                "DETACHED HEAD",
                "Local working copy started on a detached HEAD, leaving it as it is.",
            );
            return state.discard(&self.repo);
        }

        let candidates = self.reconcile_candidates(&state)?;

        if candidates.is_empty() {
            return self.finish_detached(into_commit, state);
        }

        if self.state.is_perforce {
            // The sync already rewrote the remote refs; just put the user on
            // the best surviving branch and fast-forward it if possible.
            let branch = &candidates[0];
            self.repo.checkout(branch)?;
            if self.repo.is_ancestor_of(branch, into_commit)? {
                self.repo.reset_hard(into_commit)?;
            }
            output::status(
                "CHECKOUT",
                &format!("Switched to branch \"{}\".", output::branch(branch)),
            );
            return state.discard(&self.repo);
        }

        let pull_set = self.reconcile_pull_set(&candidates)?;

        // If the starting branch survived but is not among the branches this
        // land updated, the user was working somewhere unrelated; put
        // everything back exactly as it was. An empty pull set counts: the
        // land updated no local branch at all.
        if let Some(local_ref) = state.local_ref() {
            let survived = self.repo.resolve_ref_opt(local_ref)?.is_some();
            let updated = pull_set
                .as_ref()
                .is_some_and(|set| set.iter().any(|b| b == local_ref));
            if survived && !updated {
                output::status(
                    "CHECKOUT",
                    &format!(
                        "Switching back to branch \"{}\".",
                        output::branch(local_ref)
                    ),
                );
                return state.restore(&self.repo);
            }
        }

        let pull_set = match pull_set {
            Some(pull_set) => pull_set,
            None => return self.finish_detached(into_commit, state),
        };

        // Fast-forward the chain from the furthest upstream down toward the
        // starting branch, stopping at the first branch with divergent work.
        let mut last_updated: Option<String> = None;
        for branch in &pull_set {
            // The pull set comes from tracking configuration, which can name
            // branches that no longer exist; re-check right before touching.
            if self
                .repo
                .resolve_ref_opt(&format!("refs/heads/{}", branch))?
                .is_none()
            {
                break;
            }
            if !self.repo.is_ancestor_of(branch, into_commit)? {
                break;
            }
            output::status(
                "UPDATE",
                &format!(
                    "Updating branch \"{}\" to \"{}\".",
                    output::branch(branch),
                    display_hash(into_commit)
                ),
            );
            self.repo.force_branch(branch, into_commit)?;
            last_updated = Some(branch.clone());
        }

        match last_updated {
            Some(branch) => {
                self.repo.checkout(&branch)?;
                output::status(
                    "CHECKOUT",
                    &format!("Switched to branch \"{}\".", output::branch(&branch)),
                );
                state.discard(&self.repo)
            }
            None => self.finish_detached(into_commit, state),
        }
    }

    /// Branches worth ending up on, best first: the starting branch and its
    /// tracking chain, then the into ref, then the onto refs. Destroyed and
    /// nonexistent branches are dropped.
    fn reconcile_candidates(&self, state: &LocalState) -> Result<Vec<String>> {
        let mut names: Vec<String> = Vec::new();

        for branch in state.local_branches() {
            names.push(branch.clone());
        }

        if !self.state.into_empty && !self.state.into_local {
            if let Some(into_ref) = self.state.into_ref.as_deref() {
                names.push(into_ref.to_string());
            }
        }

        for onto_ref in self.onto_refs() {
            names.push(onto_ref.clone());
        }

        let mut candidates = Vec::new();
        for name in names {
            if candidates.iter().any(|c| c == &name) {
                continue;
            }
            if self.state.deleted_branches.contains(&name) {
                continue;
            }
            if self
                .repo
                .resolve_ref_opt(&format!("refs/heads/{}", name))?
                .is_none()
            {
                continue;
            }
            candidates.push(name);
        }

        Ok(candidates)
    }

    /// The chain of local branches to fast-forward, furthest upstream first.
    /// Taken from the first candidate whose tracking path actually leads to
    /// an onto ref in the onto remote.
    fn reconcile_pull_set(&self, candidates: &[String]) -> Result<Option<Vec<String>>> {
        let onto_remote = self.onto_remote()?.to_string();

        for candidate in candidates {
            let path = self.repo.upstream_path(candidate)?;

            if let Some(cycle) = path.cycle() {
                output::warning(
                    "LOCAL CYCLE",
                    &format!(
                        "Branch \"{}\" tracks an upstream with a local cycle ({}); not \
                         updating it.",
                        candidate,
                        cycle.join(" -> ")
                    ),
                );
                continue;
            }
            if !path.is_connected_to_remote() {
                continue;
            }
            if path.remote_name() != Some(onto_remote.as_str()) {
                continue;
            }
            let remote_branch = match path.remote_branch_name() {
                Some(branch) => branch,
                None => continue,
            };
            if !self.onto_refs().iter().any(|r| r == remote_branch) {
                continue;
            }

            let mut pull_set: Vec<String> = path.local_branches().to_vec();
            pull_set.reverse();
            return Ok(Some(pull_set));
        }

        Ok(None)
    }

    fn finish_detached(&self, into_commit: &str, state: LocalState) -> Result<()> {
        self.repo.checkout(into_commit)?;
        output::warning(
            "DETACHED HEAD",
            &format!(
                "No surviving local branch tracks the landed state; the working copy is \
                 now on a detached HEAD at \"{}\".",
                display_hash(into_commit)
            ),
        );
        state.discard(&self.repo)
    }
}
