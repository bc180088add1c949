//! Publishing: push the integration commit, or report how to do it by hand.

use anyhow::Result;

use super::types::display_hash;
use super::GitLandEngine;
use crate::error::LandError;
use crate::local_state::LocalState;
use crate::ui::output;

impl GitLandEngine {
    pub(super) fn push_change(&mut self, into_commit: &str) -> Result<()> {
        if self.state.is_perforce {
            output::status(
                "SUBMIT",
                &format!(
                    "Submitting \"{}\" to Perforce...",
                    display_hash(into_commit)
                ),
            );

            if !self.repo.p4_submit(into_commit)? {
                return Err(LandError::publish(
                    "Perforce submit failed! Fix the error and run the land operation \
                     again.",
                ));
            }

            return Ok(());
        }

        let remote = self.onto_remote()?.to_string();
        let refspecs = self.onto_refspecs(into_commit);

        output::status(
            "PUSHING",
            &format!("Pushing changes to \"{}\".", remote),
        );

        // All refs move in a single push so the remote updates atomically
        // from the client's point of view.
        if !self.repo.push_refspecs(&remote, &refspecs)? {
            return Err(LandError::publish(
                "Push failed! Fix the error and run the land operation again.",
            ));
        }

        Ok(())
    }

    pub(super) fn report_held_changes(
        &self,
        into_commit: &str,
        state: &LocalState,
    ) -> Result<()> {
        output::warning(
            "HOLD",
            "Holding changes locally, they have not been pushed. Push them manually with \
             this command:",
        );

        if self.state.is_perforce {
            output::command(&format!("git p4 submit --commit {} --", into_commit));
        } else {
            let mut push = format!("git push -- {}", self.onto_remote()?);
            for refspec in self.onto_refspecs(into_commit) {
                push.push(' ');
                push.push_str(&refspec);
            }
            output::command(&push);
        }

        output::warning(
            "HOLD",
            "Local branches have not been changed, and are still in the same state as \
             before.",
        );

        let restore = state.restore_commands();
        if !restore.is_empty() {
            output::warning(
                "HOLD",
                "Local state was not restored. Restore it with these commands:",
            );
            for command in restore {
                output::command(&command);
            }
        }

        Ok(())
    }
}
