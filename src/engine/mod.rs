//! The land engine.
//!
//! A land run is a fixed sequence of decisions and mutations: resolve what to
//! land and where, integrate, publish, clean up, and put the working copy
//! back in a sane state. The sequence lives in [`run_land`], which drives a
//! [`LandEngine`] capability trait; [`GitLandEngine`] is the git
//! implementation, with its operations split across this module's files:
//!
//! - `target.rs` — onto/into resolution and target fetching
//! - `commits.rs` — symbol resolution and commit selection
//! - `merge.rs` — squash/merge execution and rollback
//! - `publish.rs` — push, Perforce submit, held-change reporting
//! - `cleanup.rs` — branch cascade and pruning
//! - `reconcile.rs` — final working-copy reconciliation
//!
//! All per-run mutability (target cache, destroyed branches, mode flags)
//! lives in [`RunState`], owned by the engine for exactly one run.

mod cleanup;
mod commits;
mod merge;
mod publish;
mod reconcile;
mod target;
pub mod types;

use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::io::IsTerminal;

use crate::config::LandConfig;
use crate::error::LandError;
use crate::local_state::LocalState;
use crate::repo::Repository;
use crate::ui::output;

pub use types::{display_hash, CommitSet, LandCommit, LandTarget, Strategy, Symbol};

/// Parsed flags for one land run.
#[derive(Debug, Clone, Default)]
pub struct LandOptions {
    /// Symbols to land; empty means "use the default symbol".
    pub symbols: Vec<String>,
    /// Explicit `--onto` refs.
    pub onto: Vec<String>,
    /// Explicit `--onto-remote`.
    pub onto_remote: Option<String>,
    /// Explicit `--into` ref.
    pub into: Option<String>,
    /// Explicit `--into-remote`.
    pub into_remote: Option<String>,
    /// Integrate against the empty state.
    pub into_empty: bool,
    /// Integrate against a purely local ref.
    pub into_local: bool,
    /// Explicit strategy selection.
    pub strategy: Option<Strategy>,
    /// Integrate but do not publish.
    pub hold: bool,
}

/// Per-run mutable state, owned by the engine for exactly one run.
#[derive(Debug, Default)]
pub struct RunState {
    pub strategy: Option<Strategy>,
    pub is_perforce: bool,
    pub into_empty: bool,
    pub into_local: bool,
    pub onto_remote: Option<String>,
    pub onto_refs: Vec<String>,
    pub into_remote: Option<String>,
    pub into_ref: Option<String>,
    /// Memoized target resolution: target key -> commit hash, or None for
    /// "no such ref". Invalidated when a fetch of that target succeeds.
    pub target_commit_cache: HashMap<String, Option<String>>,
    /// Branches destroyed by cleanup; reconciliation never touches these.
    pub deleted_branches: HashSet<String>,
}

/// The operations a land backend must provide. [`run_land`] sequences them;
/// an engine for a different version-control tool supplies an alternate
/// implementation.
pub trait LandEngine {
    fn repo(&self) -> &Repository;
    fn options(&self) -> &LandOptions;

    /// The symbol to land when the user named none.
    fn default_symbols(&self) -> Result<Vec<String>>;
    /// Resolve every symbol to a concrete commit, in place.
    fn resolve_symbols(&self, symbols: &mut [Symbol]) -> Result<()>;

    fn select_onto_refs(&mut self, symbols: &[Symbol]) -> Result<()>;
    fn confirm_onto_refs(&self) -> Result<()>;
    fn select_onto_remote(&mut self, symbols: &[Symbol]) -> Result<()>;
    fn select_into_remote(&mut self) -> Result<()>;
    fn select_into_ref(&mut self) -> Result<()>;
    /// Resolve the integration target to a commit; `None` means "the empty
    /// state".
    fn select_into_commit(&mut self) -> Result<Option<String>>;

    /// Commits reachable from the symbols but absent from the target,
    /// deduplicated, grouped per symbol with each group oldest first.
    fn select_commits(&mut self, into: Option<&str>, symbols: &[Symbol]) -> Result<Vec<LandCommit>>;

    fn execute_merge(&mut self, set: &CommitSet, into: Option<&str>) -> Result<String>;
    fn cascade(&mut self, set: &CommitSet, into: &str) -> Result<()>;
    fn prune(&mut self, sets: &[CommitSet]) -> Result<()>;
    fn publish(&mut self, into: &str) -> Result<()>;
    fn hold_changes(&self, into: &str, state: &LocalState) -> Result<()>;
    fn reconcile(&mut self, into: &str, state: LocalState) -> Result<()>;
}

/// Groups selected commits into commit sets and confirms the user actually
/// wants to land them. This is a policy seam: the engine only guarantees the
/// selection bookkeeping feeding into it, and lands whatever sets come back
/// sequentially, in order.
pub trait CommitSetPolicy {
    fn confirm_sets(
        &mut self,
        repo: &Repository,
        symbols: &[Symbol],
        commits: Vec<LandCommit>,
    ) -> Result<Vec<CommitSet>>;
}

/// The default policy: one set per input symbol, in input order, each holding
/// the commits that symbol reaches and no earlier symbol already claimed,
/// ordered oldest to newest. A symbol whose commits are all claimed by an
/// earlier symbol contributes no set. Each set's authoritative message is an
/// explicit `--message` or the set's newest commit. Prompts for confirmation
/// on a terminal unless `assume_yes` is set.
pub struct SymbolSetPolicy {
    pub message: Option<String>,
    pub assume_yes: bool,
}

impl CommitSetPolicy for SymbolSetPolicy {
    fn confirm_sets(
        &mut self,
        repo: &Repository,
        symbols: &[Symbol],
        commits: Vec<LandCommit>,
    ) -> Result<Vec<CommitSet>> {
        output::status(
            "COMMITS",
            &format!("Landing {} commit(s):", commits.len()),
        );
        for commit in &commits {
            output::bullet(&format!(
                "{} {}",
                output::hash(commit.display_hash()),
                commit.summary
            ));
        }

        if !self.assume_yes && std::io::stdin().is_terminal() {
            let proceed = dialoguer::Confirm::new()
                .with_prompt("Land these commits?")
                .default(true)
                .interact()?;
            if !proceed {
                return Err(LandError::config("Landing cancelled."));
            }
        }

        let mut claimed: HashSet<String> = HashSet::new();
        let mut sets = Vec::new();
        for symbol in symbols {
            let set_commits: Vec<LandCommit> = commits
                .iter()
                .filter(|commit| {
                    !claimed.contains(&commit.hash)
                        && commit.indirect_symbols.iter().any(|s| s == symbol.raw())
                })
                .cloned()
                .collect();
            if set_commits.is_empty() {
                continue;
            }
            claimed.extend(set_commits.iter().map(|c| c.hash.clone()));

            let newest = set_commits
                .last()
                .ok_or_else(|| LandError::internal("empty commit set survived filtering"))?;
            let message = match &self.message {
                Some(message) => message.clone(),
                None => repo
                    .runner()
                    .run_checked(&["log", "-n1", "--format=%B", &newest.hash, "--"])?,
            };

            sets.push(CommitSet::new(set_commits, message)?);
        }

        Ok(sets)
    }
}

/// Drive one complete land run against an engine.
pub fn run_land(engine: &mut dyn LandEngine, policy: &mut dyn CommitSetPolicy) -> Result<()> {
    // Resolution phase: no repository mutation happens before this completes
    // (the best-effort target fetch only updates remote-tracking refs).
    let raw_symbols = if engine.options().symbols.is_empty() {
        engine.default_symbols()?
    } else {
        engine.options().symbols.clone()
    };
    let mut symbols: Vec<Symbol> = raw_symbols.into_iter().map(Symbol::new).collect();
    engine.resolve_symbols(&mut symbols)?;

    engine.select_onto_refs(&symbols)?;
    engine.confirm_onto_refs()?;
    engine.select_onto_remote(&symbols)?;
    engine.select_into_remote()?;
    engine.select_into_ref()?;
    let into = engine.select_into_commit()?;

    let commits = engine.select_commits(into.as_deref(), &symbols)?;
    if commits.is_empty() {
        return Err(LandError::no_op(
            "The selected changes are already present in the target; there is nothing to land.",
        ));
    }

    let sets = policy.confirm_sets(engine.repo(), &symbols, commits)?;
    if sets.is_empty() {
        return Err(LandError::config("Nothing was confirmed for landing."));
    }

    let hold = engine.options().hold;
    let mut state = Some(LocalState::save(engine.repo())?);

    // Execution phase. On failure the working copy goes back to where the
    // user started; the merge executor has already rolled back its own
    // half-done attempt by the time an error reaches this loop.
    let mut cursor = into;
    for set in &sets {
        let step = engine
            .execute_merge(set, cursor.as_deref())
            .and_then(|merged| {
                if !hold {
                    engine.cascade(set, &merged)?;
                }
                Ok(merged)
            });
        match step {
            Ok(merged) => cursor = Some(merged),
            Err(err) => {
                if let Some(state) = state.take() {
                    let _ = state.restore(engine.repo());
                }
                return Err(err);
            }
        }
    }

    let into_commit = cursor
        .ok_or_else(|| LandError::internal("merge loop finished without an integration commit"))?;

    if hold {
        // Deliberately leaves the snapshot (and any stash) in place; the
        // hold report tells the user how to restore it by hand.
        if let Some(state) = state.take() {
            engine.hold_changes(&into_commit, &state)?;
        }
        return Ok(());
    }

    engine.prune(&sets)?;
    engine.publish(&into_commit)?;

    if let Some(state) = state.take() {
        engine.reconcile(&into_commit, state)?;
    }

    output::success("Landed changes.");
    Ok(())
}

/// The git implementation of the land engine.
pub struct GitLandEngine {
    repo: Repository,
    options: LandOptions,
    config: LandConfig,
    state: RunState,
}

impl GitLandEngine {
    pub fn new(repo: Repository, options: LandOptions, config: LandConfig) -> Self {
        Self {
            repo,
            options,
            config,
            state: RunState::default(),
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// The active integration strategy: flag, then persisted configuration,
    /// then squash.
    pub(crate) fn strategy(&self) -> Strategy {
        self.state
            .strategy
            .or(self.options.strategy)
            .or(self.config.strategy)
            .unwrap_or(Strategy::Squash)
    }

    pub(crate) fn is_squash_strategy(&self) -> bool {
        self.strategy().is_squash()
    }

    pub(crate) fn onto_remote(&self) -> Result<&str> {
        self.state
            .onto_remote
            .as_deref()
            .ok_or_else(|| LandError::internal("onto remote used before selection"))
    }

    pub(crate) fn onto_refs(&self) -> &[String] {
        &self.state.onto_refs
    }

    pub(crate) fn into_remote(&self) -> Result<&str> {
        self.state
            .into_remote
            .as_deref()
            .ok_or_else(|| LandError::internal("into remote used before selection"))
    }

    pub(crate) fn into_ref(&self) -> Result<&str> {
        self.state
            .into_ref
            .as_deref()
            .ok_or_else(|| LandError::internal("into ref used before selection"))
    }

    /// Refspecs pushing the integration commit to every onto ref. The
    /// destination is fully qualified so pushes can create refs that do not
    /// exist yet.
    pub(crate) fn onto_refspecs(&self, into_commit: &str) -> Vec<String> {
        self.state
            .onto_refs
            .iter()
            .map(|onto_ref| format!("{}:refs/heads/{}", into_commit, onto_ref))
            .collect()
    }
}

impl LandEngine for GitLandEngine {
    fn repo(&self) -> &Repository {
        &self.repo
    }

    fn options(&self) -> &LandOptions {
        &self.options
    }

    fn default_symbols(&self) -> Result<Vec<String>> {
        self.get_default_symbols()
    }

    fn resolve_symbols(&self, symbols: &mut [Symbol]) -> Result<()> {
        self.do_resolve_symbols(symbols)
    }

    fn select_onto_refs(&mut self, symbols: &[Symbol]) -> Result<()> {
        let refs = self.choose_onto_refs(symbols)?;
        self.state.onto_refs = refs;
        Ok(())
    }

    fn confirm_onto_refs(&self) -> Result<()> {
        self.check_onto_refs()
    }

    fn select_onto_remote(&mut self, symbols: &[Symbol]) -> Result<()> {
        let remote = self.choose_onto_remote(symbols)?;
        self.state.onto_remote = Some(remote);
        Ok(())
    }

    fn select_into_remote(&mut self) -> Result<()> {
        self.choose_into_remote()
    }

    fn select_into_ref(&mut self) -> Result<()> {
        self.choose_into_ref()
    }

    fn select_into_commit(&mut self) -> Result<Option<String>> {
        self.choose_into_commit()
    }

    fn select_commits(
        &mut self,
        into: Option<&str>,
        symbols: &[Symbol],
    ) -> Result<Vec<LandCommit>> {
        self.collect_commits(into, symbols)
    }

    fn execute_merge(&mut self, set: &CommitSet, into: Option<&str>) -> Result<String> {
        self.do_execute_merge(set, into)
    }

    fn cascade(&mut self, set: &CommitSet, into: &str) -> Result<()> {
        self.cascade_branches(set, into)
    }

    fn prune(&mut self, sets: &[CommitSet]) -> Result<()> {
        self.prune_branches(sets)
    }

    fn publish(&mut self, into: &str) -> Result<()> {
        self.push_change(into)
    }

    fn hold_changes(&self, into: &str, state: &LocalState) -> Result<()> {
        self.report_held_changes(into, state)
    }

    fn reconcile(&mut self, into: &str, state: LocalState) -> Result<()> {
        self.reconcile_local_state(into, state)
    }
}
