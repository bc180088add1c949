//! Target resolution: where changes land ("onto") and what they are
//! integrated against ("into").
//!
//! Every decision follows the same priority order: explicit flag, then
//! persisted configuration, then inference from tracking branches, then a
//! fixed default. Inference that produces more than one answer is an error
//! naming the flag that disambiguates it.

use anyhow::Result;

use super::types::{display_hash, LandTarget, Symbol};
use super::GitLandEngine;
use crate::error::LandError;
use crate::ui::output;

/// Default target branch when nothing selects one.
const DEFAULT_ONTO: &str = "master";
/// Default remote when nothing selects one.
const DEFAULT_REMOTE: &str = "origin";
/// Remote name git-p4 maintains for a Perforce-synchronized working copy.
const PERFORCE_REMOTE: &str = "p4";

impl GitLandEngine {
    // =========================================================================
    // Onto selection
    // =========================================================================

    pub(super) fn choose_onto_refs(&self, symbols: &[Symbol]) -> Result<Vec<String>> {
        if !self.options.onto.is_empty() {
            output::status(
                "ONTO TARGET",
                &format!(
                    "Refs were selected with the \"--onto\" flag: {}.",
                    self.options.onto.join(", ")
                ),
            );
            return Ok(self.options.onto.clone());
        }

        if !self.config.onto.is_empty() {
            output::status(
                "ONTO TARGET",
                &format!(
                    "Refs were selected by reading \"land.onto\" configuration: {}.",
                    self.config.onto.join(", ")
                ),
            );
            return Ok(self.config.onto.clone());
        }

        let mut inferred: Vec<String> = Vec::new();
        for symbol in symbols {
            let path = self.repo.upstream_path(symbol.raw())?;
            if path.length() == 0 {
                continue;
            }

            if let Some(cycle) = path.cycle() {
                output::warning(
                    "LOCAL CYCLE",
                    &format!(
                        "Local branch \"{}\" tracks an upstream, but following it leads to \
                         a local cycle; ignoring branch upstream.",
                        symbol.raw()
                    ),
                );
                output::warning("LOCAL CYCLE", &cycle.join(" -> "));
                continue;
            }

            if !path.is_connected_to_remote() {
                output::warning(
                    "NO PATH TO REMOTE",
                    &format!(
                        "Local branch \"{}\" tracks an upstream, but there is no path to a \
                         remote; ignoring branch upstream.",
                        symbol.raw()
                    ),
                );
                continue;
            }

            if let Some(onto) = path.remote_branch_name() {
                if !inferred.iter().any(|r| r == onto) {
                    inferred.push(onto.to_string());
                }
            }
        }

        if inferred.len() > 1 {
            return Err(LandError::config(
                "The symbols you are landing are connected to multiple different remote \
                 branches via tracking upstreams. Use \"--onto\" to select the refs you \
                 want to push to.",
            ));
        }

        if let Some(onto) = inferred.into_iter().next() {
            output::status(
                "ONTO TARGET",
                &format!(
                    "Landing onto target \"{}\", selected by following tracking branches \
                     upstream to the closest remote branch.",
                    onto
                ),
            );
            return Ok(vec![onto]);
        }

        output::status(
            "ONTO TARGET",
            &format!(
                "Landing onto target \"{}\", the default target under git.",
                DEFAULT_ONTO
            ),
        );
        Ok(vec![DEFAULT_ONTO.to_string()])
    }

    pub(super) fn check_onto_refs(&self) -> Result<()> {
        for onto_ref in self.onto_refs() {
            if onto_ref.is_empty() {
                return Err(LandError::config(
                    "Selected \"onto\" ref is invalid: the empty string is not a valid ref.",
                ));
            }
        }
        Ok(())
    }

    pub(super) fn choose_onto_remote(&mut self, symbols: &[Symbol]) -> Result<String> {
        let remote = self.infer_onto_remote(symbols)?;

        let is_pushable = self.repo.is_pushable_remote(&remote)?;
        let is_perforce = self.repo.is_perforce_remote(&remote)?;

        if !is_pushable && !is_perforce {
            return Err(LandError::config(format!(
                "No pushable remote \"{}\" exists. Use the \"--onto-remote\" flag to \
                 choose a valid, pushable remote to land changes onto.",
                remote
            )));
        }

        if is_perforce {
            self.state.is_perforce = true;

            output::warning(
                "P4 MODE",
                "Operating in git/Perforce mode after selecting a Perforce remote.",
            );

            if !self.is_squash_strategy() {
                return Err(LandError::config(
                    "Perforce mode does not support the \"merge\" land strategy. Use the \
                     \"squash\" land strategy when landing to a Perforce remote.",
                ));
            }
        }

        // Pin the choice for the rest of the run.
        self.state.strategy = Some(self.strategy());

        Ok(remote)
    }

    fn infer_onto_remote(&self, symbols: &[Symbol]) -> Result<String> {
        if let Some(remote) = &self.options.onto_remote {
            output::status(
                "ONTO REMOTE",
                &format!(
                    "Remote \"{}\" was selected with the \"--onto-remote\" flag.",
                    remote
                ),
            );
            return Ok(remote.clone());
        }

        if let Some(remote) = &self.config.onto_remote {
            output::status(
                "ONTO REMOTE",
                &format!(
                    "Remote \"{}\" was selected by reading \"land.onto-remote\" configuration.",
                    remote
                ),
            );
            return Ok(remote.clone());
        }

        let mut inferred: Vec<String> = Vec::new();
        for symbol in symbols {
            let path = self.repo.upstream_path(symbol.raw())?;
            if let Some(remote) = path.remote_name() {
                if !inferred.iter().any(|r| r == remote) {
                    inferred.push(remote.to_string());
                }
            }
        }

        if inferred.len() > 1 {
            return Err(LandError::config(
                "The \"onto\" refs you have selected are connected to multiple different \
                 remotes via tracking upstreams. Use \"--onto-remote\" to select a single \
                 remote.",
            ));
        }

        if let Some(remote) = inferred.into_iter().next() {
            output::status(
                "ONTO REMOTE",
                &format!(
                    "Remote \"{}\" was selected by following tracking branches upstream to \
                     the closest remote.",
                    remote
                ),
            );
            return Ok(remote);
        }

        if self.repo.is_perforce_remote(PERFORCE_REMOTE)? {
            output::status(
                "ONTO REMOTE",
                &format!(
                    "Perforce remote \"{}\" was selected because the existence of this \
                     remote implies this working copy was synchronized from a Perforce \
                     repository.",
                    PERFORCE_REMOTE
                ),
            );
            return Ok(PERFORCE_REMOTE.to_string());
        }

        output::status(
            "ONTO REMOTE",
            &format!(
                "Landing onto remote \"{}\", the default remote under git.",
                DEFAULT_REMOTE
            ),
        );
        Ok(DEFAULT_REMOTE.to_string())
    }

    // =========================================================================
    // Into selection
    // =========================================================================

    pub(super) fn choose_into_remote(&mut self) -> Result<()> {
        if self.options.into_empty {
            self.state.into_empty = true;
            output::status(
                "INTO REMOTE",
                "Will merge into empty state, selected with the \"--into-empty\" flag.",
            );
            return Ok(());
        }

        if self.options.into_local {
            self.state.into_local = true;
            output::status(
                "INTO REMOTE",
                "Will merge into local state, selected with the \"--into-local\" flag.",
            );
            return Ok(());
        }

        if let Some(into_remote) = &self.options.into_remote {
            if !self.repo.is_fetchable_remote(into_remote)? {
                return Err(LandError::config(format!(
                    "Remote \"{}\", specified with \"--into-remote\", is not a valid \
                     fetchable remote.",
                    into_remote
                )));
            }
            self.state.into_remote = Some(into_remote.clone());
            output::status(
                "INTO REMOTE",
                &format!(
                    "Will merge into remote \"{}\", selected with the \"--into-remote\" flag.",
                    into_remote
                ),
            );
            return Ok(());
        }

        let onto = self.onto_remote()?.to_string();
        output::status(
            "INTO REMOTE",
            &format!(
                "Will merge into remote \"{}\" by default, because this is the remote the \
                 change is landing onto.",
                onto
            ),
        );
        self.state.into_remote = Some(onto);
        Ok(())
    }

    pub(super) fn choose_into_ref(&mut self) -> Result<()> {
        if self.options.into_empty {
            output::status(
                "INTO TARGET",
                "Will merge into empty state, selected with the \"--into-empty\" flag.",
            );
            return Ok(());
        }

        if let Some(into) = &self.options.into {
            self.state.into_ref = Some(into.clone());
            output::status(
                "INTO TARGET",
                &format!(
                    "Will merge into target \"{}\", selected with the \"--into\" flag.",
                    into
                ),
            );
            return Ok(());
        }

        let onto = self
            .onto_refs()
            .first()
            .cloned()
            .ok_or_else(|| LandError::internal("into ref selection ran before onto refs"))?;
        let reason = if self.onto_refs().len() > 1 {
            "because this is the first \"onto\" target"
        } else {
            "because this is the \"onto\" target"
        };
        output::status(
            "INTO TARGET",
            &format!("Will merge into target \"{}\" by default, {}.", onto, reason),
        );
        self.state.into_ref = Some(onto);
        Ok(())
    }

    pub(super) fn choose_into_commit(&mut self) -> Result<Option<String>> {
        if self.state.into_empty {
            output::status("INTO COMMIT", "Preparing merge into the empty state.");
            return Ok(None);
        }

        if self.state.into_local {
            // Purely local: the ref must identify some actual commit.
            let local_ref = self.into_ref()?.to_string();
            let into_commit = self.repo.resolve_ref_opt(&local_ref)?.ok_or_else(|| {
                LandError::config(format!("Local ref \"{}\" does not exist.", local_ref))
            })?;
            output::status(
                "INTO COMMIT",
                &format!(
                    "Preparing merge into local target \"{}\", at commit \"{}\".",
                    local_ref,
                    display_hash(&into_commit)
                ),
            );
            return Ok(Some(into_commit));
        }

        let target = LandTarget::new(self.into_remote()?, self.into_ref()?);

        if let Some(commit) = self.fetch_target(&target)? {
            output::status(
                "INTO COMMIT",
                &format!(
                    "Preparing merge into \"{}\" from remote \"{}\", at commit \"{}\".",
                    target.ref_name,
                    target.remote,
                    display_hash(&commit)
                ),
            );
            return Ok(Some(commit));
        }

        // No valid target. If the user named it explicitly, that is an error;
        // otherwise fall back to landing into the empty state to create it.
        if self.options.into.is_some() {
            return Err(LandError::config(format!(
                "Ref \"{}\" does not exist in remote \"{}\".",
                target.ref_name, target.remote
            )));
        }

        self.state.into_empty = true;
        output::status(
            "INTO COMMIT",
            &format!(
                "Preparing merge into the empty state to create target \"{}\" in remote \
                 \"{}\".",
                target.ref_name, target.remote
            ),
        );
        Ok(None)
    }

    // =========================================================================
    // Target fetching
    // =========================================================================

    /// Bring the local copy of a land target up to date and resolve it, or
    /// return `None` if the ref does not exist in the remote.
    fn fetch_target(&mut self, target: &LandTarget) -> Result<Option<String>> {
        if self.state.is_perforce {
            output::status(
                "P4 SYNC",
                &format!("Synchronizing \"{}\" from Perforce...", target.ref_name),
            );

            let branch = format!("{}/{}", target.remote, target.ref_name);
            if !self.repo.p4_sync_branch(&branch)? {
                return Err(LandError::publish(
                    "Perforce sync failed! Fix the error and run the land operation again.",
                ));
            }

            // The sync moved the remote-tracking refs under us.
            self.state.target_commit_cache.remove(&target.key());

            return Ok(Some(self.require_target_commit(target)?));
        }

        if self.resolve_target_commit(target)?.is_none() {
            output::warning(
                "TARGET",
                &format!(
                    "No local copy of ref \"{}\" in remote \"{}\" exists, attempting \
                     fetch...",
                    target.ref_name, target.remote
                ),
            );

            self.fetch_land_target(target, true)?;

            let commit = self.resolve_target_commit(target)?;
            if commit.is_none() {
                return Ok(None);
            }

            output::status(
                "FETCHED",
                &format!(
                    "Fetched ref \"{}\" from remote \"{}\".",
                    target.ref_name, target.remote
                ),
            );
            return Ok(commit);
        }

        output::status(
            "FETCH",
            &format!(
                "Fetching \"{}\" from remote \"{}\"...",
                target.ref_name, target.remote
            ),
        );
        self.fetch_land_target(target, false)?;

        Ok(Some(self.require_target_commit(target)?))
    }

    /// Resolve a target's local remote-tracking ref, memoized per run.
    /// Entries are either a commit hash or an explicit "absent" marker.
    pub(super) fn resolve_target_commit(&mut self, target: &LandTarget) -> Result<Option<String>> {
        let key = target.key();
        if let Some(cached) = self.state.target_commit_cache.get(&key) {
            return Ok(cached.clone());
        }
        let resolved = self
            .repo
            .resolve_remote_ref(&target.remote, &target.ref_name)?;
        self.state.target_commit_cache.insert(key, resolved.clone());
        Ok(resolved)
    }

    fn require_target_commit(&mut self, target: &LandTarget) -> Result<String> {
        self.resolve_target_commit(target)?.ok_or_else(|| {
            LandError::internal(format!(
                "no ref \"{}\" exists in remote \"{}\"",
                target.ref_name, target.remote
            ))
        })
    }

    /// Fetch a land target from its remote. On success the cached resolution
    /// for this exact target key is invalidated so the next lookup sees the
    /// fetched state.
    fn fetch_land_target(&mut self, target: &LandTarget, ignore_failure: bool) -> Result<()> {
        let fetched = self.repo.fetch_ref(&target.remote, &target.ref_name)?;

        if !fetched && !ignore_failure {
            return Err(LandError::publish(format!(
                "Fetch of \"{}\" from remote \"{}\" failed! Fix the error and run the \
                 land operation again.",
                target.ref_name, target.remote
            )));
        }

        if fetched {
            self.state.target_commit_cache.remove(&target.key());
        }

        Ok(())
    }
}
