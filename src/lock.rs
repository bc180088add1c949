//! Exclusive operation lock.
//!
//! The land pipeline assumes it is the sole mutator of the working copy for
//! the duration of a run. This lock enforces that against concurrent runway
//! invocations; it does nothing about the user running git by hand.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::repo::Repository;

/// Maximum age (in seconds) for a lock file to be considered stale. Locks
/// older than this whose holder never released them (crashed process) are
/// cleaned up on the next acquisition attempt.
const STALE_LOCK_AGE_SECS: u64 = 300;

/// An exclusive lock on runway operations, held for one land run.
///
/// Released automatically when dropped.
#[derive(Debug)]
pub struct OperationLock {
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl OperationLock {
    /// Acquire the lock for a repository, cleaning up a stale lock from a
    /// crashed process if necessary.
    pub fn acquire(repo: &Repository) -> Result<Self> {
        let runway_dir = repo.git_dir().join("runway");
        if !runway_dir.exists() {
            fs::create_dir_all(&runway_dir)?;
        }
        let lock_path = runway_dir.join("operation.lock");

        match Self::try_acquire(&lock_path) {
            Ok(lock) => Ok(lock),
            Err(first_error) => {
                if Self::is_stale(&lock_path)? {
                    eprintln!("Cleaning up stale lock from a previous run...");
                    if let Err(e) = fs::remove_file(&lock_path) {
                        eprintln!("Warning: could not remove stale lock: {}", e);
                    }
                    Self::try_acquire(&lock_path)
                } else {
                    Err(first_error)
                }
            }
        }
    }

    fn try_acquire(lock_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .with_context(|| format!("Failed to create lock file at {}", lock_path.display()))?;

        file.try_lock_exclusive().map_err(|_| {
            anyhow::anyhow!(
                "Another runway operation is already in progress in this repository.\n\
                 Wait for it to finish, or remove {} if it crashed.",
                lock_path.display()
            )
        })?;

        let mut writable = file.try_clone()?;
        writable.set_len(0)?;
        writeln!(writable, "{}", std::process::id())?;

        Ok(Self {
            file,
            path: lock_path.to_path_buf(),
        })
    }

    /// A lock is stale when its file has not been touched for longer than a
    /// run could plausibly last.
    fn is_stale(lock_path: &Path) -> Result<bool> {
        let metadata = match fs::metadata(lock_path) {
            Ok(metadata) => metadata,
            Err(_) => return Ok(false),
        };
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();
        Ok(age.as_secs() > STALE_LOCK_AGE_SECS)
    }
}

impl Drop for OperationLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
