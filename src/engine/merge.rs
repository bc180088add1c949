//! Merge execution: integrate one commit set into the target.
//!
//! A failed merge never leaves the repository mid-merge. The attempt is
//! aborted and the working copy reset before the error propagates, so the
//! caller only ever has to restore the pre-run checkout.

use anyhow::Result;

use super::types::{display_hash, CommitSet, Strategy};
use super::GitLandEngine;
use crate::error::LandError;
use crate::ui::output;

impl GitLandEngine {
    /// Integrate a commit set into `into` and return the new integration
    /// commit. `None` integrates into the empty state: a synthetic parentless
    /// commit is merged against, then stripped back out of the ancestry.
    pub(super) fn do_execute_merge(
        &mut self,
        set: &CommitSet,
        into: Option<&str>,
    ) -> Result<String> {
        let source_commit = set.newest().hash.clone();

        let (into_commit, is_empty) = match into {
            Some(commit) => (commit.to_string(), false),
            None => (self.repo.write_empty_commit()?, true),
        };

        // An empty diff means the target already has every change in the
        // set. Landing it would create an empty commit, so refuse before
        // touching the working copy or any ref.
        let diff = self.repo.diff_text(&into_commit, &source_commit)?;
        if diff.is_empty() {
            return Err(LandError::no_op(format!(
                "Merging {} into \"{}\" creates an empty commit. The changes are already \
                 present in the target.",
                self.describe_set(set),
                display_hash(&into_commit)
            )));
        }

        self.repo.checkout(&into_commit)?;

        let newest = set.newest();
        output::status(
            "MERGING",
            &format!("{} {}", output::hash(newest.display_hash()), newest.summary),
        );

        let is_squash = self.is_squash_strategy();

        let mut args: Vec<&str> = vec!["--no-stat", "--no-commit"];
        if is_empty {
            // The synthetic commit shares no history with anything.
            args.push("--allow-unrelated-histories");
        }
        match self.strategy() {
            Strategy::Squash => args.extend(["--ff", "--squash"]),
            Strategy::Merge => args.push("--no-ff"),
        }
        args.extend(["--", source_commit.as_str()]);

        let outcome = self.repo.merge(&args)?;
        if !outcome.success() {
            self.repo.abort_merge_and_reset()?;
            return Err(LandError::conflict(format!(
                "Local commits from {} do not merge cleanly into \"{}\". Merge or rebase \
                 these changes so they can merge cleanly, then run the land operation \
                 again.",
                self.describe_set(set),
                display_hash(&into_commit)
            )));
        }

        // The squash/merge commit should read as the original author's work,
        // not the pusher's.
        let (author, date) = self.repo.author_and_date(&source_commit)?;
        self.repo.commit_with_author(&author, &date, set.message())?;

        let merged = self.repo.head_commit()?;

        if !is_empty {
            return Ok(merged);
        }

        // Strip the synthetic parent so the published history starts at a
        // real root. A squash becomes a parentless commit; a merge keeps only
        // the source side.
        let mut raw = self.repo.read_raw_commit(&merged)?;
        let parents = if is_squash {
            Vec::new()
        } else {
            vec![source_commit]
        };
        raw.set_parents(parents);
        let rewritten = self.repo.write_raw_commit(&raw)?;
        self.repo.checkout(&rewritten)?;

        output::status(
            "ROOT COMMIT",
            &format!(
                "Created new root commit \"{}\".",
                display_hash(&rewritten)
            ),
        );

        Ok(rewritten)
    }

    /// Human description of a commit set for error text: direct symbols if
    /// any, then indirect symbols, then the bare hash.
    fn describe_set(&self, set: &CommitSet) -> String {
        let newest = set.newest();
        if !newest.direct_symbols.is_empty() {
            format!("\"{}\"", newest.direct_symbols.join("\", \""))
        } else if !newest.indirect_symbols.is_empty() {
            format!(
                "commit \"{}\" (reached from \"{}\")",
                newest.display_hash(),
                newest.indirect_symbols.join("\", \"")
            )
        } else {
            format!("commit \"{}\"", newest.display_hash())
        }
    }
}
