//! Post-integration cleanup: cascade dependent branches onto the landed
//! state, then destroy branches the land operation has fully consumed.

use anyhow::Result;

use super::types::{display_hash, CommitSet};
use super::GitLandEngine;
use crate::error::LandError;
use crate::repo::refs::RefQuery;
use crate::ui::output;

impl GitLandEngine {
    /// Rebase branches that contain the landed set onto the new integration
    /// commit. Only meaningful under squash: the original commits vanish from
    /// the published history, so dependent work must move. Under merge the
    /// originals survive and nothing needs rewriting.
    pub(super) fn cascade_branches(&mut self, set: &CommitSet, new_commit: &str) -> Result<()> {
        if !self.is_squash_strategy() {
            return Ok(());
        }

        let old_commit = &set.newest().hash;

        for (branch, branch_head) in self
            .repo
            .branches_for_commit(old_commit, RefQuery::Contains)?
        {
            // Branches pointing exactly at the landed commit are consumed by
            // the land; cleanup destroys them instead.
            if &branch_head == old_commit {
                continue;
            }
            if self.state.deleted_branches.contains(&branch) {
                continue;
            }

            output::status(
                "CASCADE",
                &format!(
                    "Rebasing \"{}\" onto landed state.",
                    output::branch(&branch)
                ),
            );

            let outcome = self.repo.rebase_onto(new_commit, old_commit, &branch)?;
            if !outcome.success() {
                // Never leave the repository mid-rebase.
                self.repo.abort_rebase()?;
                return Err(LandError::conflict(format!(
                    "Branch \"{}\" does not rebase cleanly onto the landed state. Rebase \
                     it manually, then run the land operation again.",
                    branch
                )));
            }
        }

        Ok(())
    }

    /// Destroy branches whose heads were landed. Each destruction prints a
    /// recovery command first, so a surprised user can undo it.
    pub(super) fn prune_branches(&mut self, sets: &[CommitSet]) -> Result<()> {
        for set in sets {
            let old_commit = &set.newest().hash;

            for (branch, branch_head) in self
                .repo
                .branches_for_commit(old_commit, RefQuery::PointsAt)?
            {
                if self.state.deleted_branches.contains(&branch) {
                    continue;
                }

                output::status(
                    "CLEANUP",
                    &format!(
                        "Destroying branch \"{}\". To recover, run:",
                        output::branch(&branch)
                    ),
                );
                output::command(&recovery_command(&branch, &branch_head));

                self.repo.delete_branch(&branch)?;
                self.state.deleted_branches.insert(branch);
            }
        }

        Ok(())
    }
}

fn recovery_command(branch: &str, branch_head: &str) -> String {
    format!("git checkout -b {} {}", branch, display_hash(branch_head))
}

#[cfg(test)]
mod tests {
    use super::recovery_command;

    #[test]
    fn test_recovery_command_uses_short_hash() {
        let command = recovery_command("feature1", "0123456789abcdef0123456789abcdef01234567");
        assert_eq!(command, "git checkout -b feature1 0123456789ab");
    }
}
