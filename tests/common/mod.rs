use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use runway::config::Config;
use runway::engine::{run_land, GitLandEngine, LandOptions, SymbolSetPolicy};
use runway::repo::Repository;

/// Run a git command in a directory, asserting it succeeds. Returns trimmed
/// stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("failed to run git {:?}: {}", args, e));
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Run a git command expecting it may fail; returns success flag.
#[allow(dead_code)]
pub fn git_ok(dir: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// A working copy cloned from a local bare "origin", with an initial commit
/// on master pushed and tracking configured.
pub struct Fixture {
    #[allow(dead_code)]
    root: TempDir,
    pub origin: PathBuf,
    pub clone: PathBuf,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        let root = TempDir::new()?;
        let origin = root.path().join("origin.git");
        let clone = root.path().join("clone");

        git(root.path(), &["init", "--bare", "-b", "master", "origin.git"]);

        fs::create_dir(&clone)?;
        git(&clone, &["init", "-b", "master"]);
        git(&clone, &["config", "user.name", "Test User"]);
        git(&clone, &["config", "user.email", "test@example.com"]);
        git(&clone, &["remote", "add", "origin", origin.to_str().unwrap()]);

        fs::write(clone.join("README.md"), "# fixture\n")?;
        git(&clone, &["add", "."]);
        git(&clone, &["commit", "-m", "Initial commit"]);
        git(&clone, &["push", "-u", "origin", "master"]);

        Ok(Self {
            root,
            origin,
            clone,
        })
    }

    /// Create a branch from the current HEAD, tracking origin/master, and
    /// commit one file change to it.
    pub fn branch_with_commit(&self, branch: &str, file: &str, message: &str) -> Result<()> {
        git(&self.clone, &["checkout", "-b", branch]);
        git(
            &self.clone,
            &["branch", "--set-upstream-to=origin/master", branch],
        );
        self.commit_file(file, message)
    }

    /// Write a file and commit it on the current branch.
    pub fn commit_file(&self, file: &str, message: &str) -> Result<()> {
        fs::write(self.clone.join(file), format!("{}\n", message))?;
        git(&self.clone, &["add", "."]);
        git(&self.clone, &["commit", "-m", message]);
        Ok(())
    }

    /// Resolve a ref in the working copy.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", reference])
            .current_dir(&self.clone)
            .output()
            .expect("failed to run git rev-parse");
        if output.status.success() {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            None
        }
    }

    /// Resolve a ref directly in the bare origin.
    pub fn resolve_origin(&self, reference: &str) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", reference])
            .current_dir(&self.origin)
            .output()
            .expect("failed to run git rev-parse");
        if output.status.success() {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            None
        }
    }

    pub fn current_branch(&self) -> Option<String> {
        let output = Command::new("git")
            .args(["symbolic-ref", "--short", "HEAD"])
            .current_dir(&self.clone)
            .output()
            .expect("failed to run git symbolic-ref");
        if output.status.success() {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            None
        }
    }

    /// Drive a full land run against the working copy, bypassing the CLI.
    #[allow(dead_code)]
    pub fn land(&self, options: LandOptions, message: Option<&str>) -> Result<()> {
        let repo = Repository::from_path(&self.clone)?;
        let config = Config::load(&repo)?;
        let mut engine = GitLandEngine::new(repo, options, config.land);
        let mut policy = SymbolSetPolicy {
            message: message.map(String::from),
            assume_yes: true,
        };
        run_land(&mut engine, &mut policy)
    }
}

/// Options landing the named symbols with everything else defaulted.
#[allow(dead_code)]
pub fn land_options(symbols: &[&str]) -> LandOptions {
    LandOptions {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}
