//! Remote queries and network operations.
//!
//! Fetch, push, and the `git p4` bridge commands run in passthrough mode:
//! they may prompt for credentials, so their stdio belongs to the terminal
//! for the duration of the call.

use anyhow::Result;

use super::Repository;

impl Repository {
    /// A remote we can push to: it has a configured URL (or push URL).
    pub fn is_pushable_remote(&self, remote: &str) -> Result<bool> {
        if self.config_get(&format!("remote.{}.pushurl", remote))?.is_some() {
            return Ok(true);
        }
        Ok(self.config_get(&format!("remote.{}.url", remote))?.is_some())
    }

    /// A remote we can fetch from: it has a configured URL.
    pub fn is_fetchable_remote(&self, remote: &str) -> Result<bool> {
        Ok(self.config_get(&format!("remote.{}.url", remote))?.is_some())
    }

    /// Detect a git-p4 bridge remote. `git p4` does not configure a real
    /// remote; it only maintains remote-tracking refs under
    /// `refs/remotes/p4/`. A "p4" namespace with tracking refs but no
    /// configured URL means this working copy was synchronized from
    /// Perforce.
    pub fn is_perforce_remote(&self, remote: &str) -> Result<bool> {
        if remote != "p4" {
            return Ok(false);
        }
        if self.config_get(&format!("remote.{}.url", remote))?.is_some() {
            return Ok(false);
        }
        let refs = self.runner().run(&[
            "for-each-ref",
            "--count=1",
            &format!("refs/remotes/{}/", remote),
        ])?;
        Ok(refs.success() && !refs.stdout.trim().is_empty())
    }

    /// Resolve the remote-tracking ref for `ref_name` in `remote`, or `None`
    /// if no local copy of it exists.
    pub fn resolve_remote_ref(&self, remote: &str, ref_name: &str) -> Result<Option<String>> {
        self.resolve_ref_opt(&format!("refs/remotes/{}/{}", remote, ref_name))
    }

    /// Fetch one ref from a remote, interactively. Returns whether the fetch
    /// succeeded.
    pub fn fetch_ref(&self, remote: &str, ref_name: &str) -> Result<bool> {
        self.runner()
            .passthru(&["fetch", "--no-tags", "--quiet", "--", remote, ref_name])
    }

    /// Push refspecs to a remote in a single invocation, interactively.
    /// Returns whether the push succeeded.
    pub fn push_refspecs(&self, remote: &str, refspecs: &[String]) -> Result<bool> {
        let mut args = vec!["push", "--", remote];
        args.extend(refspecs.iter().map(|s| s.as_str()));
        self.runner().passthru(&args)
    }

    /// Synchronize one Perforce-bridged branch, interactively. Returns
    /// whether the sync succeeded.
    pub fn p4_sync_branch(&self, branch: &str) -> Result<bool> {
        self.runner()
            .passthru(&["p4", "sync", "--silent", "--branch", branch, "--"])
    }

    /// Submit a commit through the Perforce bridge, interactively. Returns
    /// whether the submit succeeded.
    ///
    /// The submit message was already finalized by the land pipeline, so the
    /// interactive edit and confirmation steps are disabled. Conflicts abort
    /// the submit; the user fixes them and re-runs the whole operation. Moves
    /// are detected and submitted as Perforce move operations, and the
    /// implicit post-submit rebase is disabled (the implicit sync is enough
    /// to leave the remote state updated, as after a push).
    pub fn p4_submit(&self, commit: &str) -> Result<bool> {
        self.runner().passthru(&[
            "-c",
            "git-p4.skipSubmitEdit=true",
            "-c",
            "git-p4.skipSubmitEditCheck=true",
            "p4",
            "submit",
            "--disable-rebase",
            "-M",
            "--conflict=quit",
            "--commit",
            commit,
            "--",
        ])
    }
}
