//! The `land` command: wire the CLI to the engine.

use anyhow::Result;

use crate::config::Config;
use crate::engine::{run_land, GitLandEngine, LandOptions, SymbolSetPolicy};
use crate::lock::OperationLock;
use crate::repo::Repository;

pub fn run(options: LandOptions, message: Option<String>, yes: bool) -> Result<()> {
    let repo = Repository::discover()?;
    let config = Config::load(&repo)?;

    // One land at a time per working copy. Held until the run finishes.
    let _lock = OperationLock::acquire(&repo)?;

    let mut engine = GitLandEngine::new(repo, options, config.land);
    let mut policy = SymbolSetPolicy {
        message,
        assume_yes: yes,
    };

    run_land(&mut engine, &mut policy)
}
