//! Advisory per-stage locks.
//!
//! A lock is a `.{stage}.lock` file in the storage root, created with
//! create-new semantics. The file carries an owner token so a guard only ever
//! deletes the lock it created. Reclaiming and releasing both rename the lock
//! aside before looking at it, so the file that gets checked is the file that
//! gets removed.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::stage::Stage;
use crate::errors::{FeedflowError, Result};
use crate::utils::iso_timestamp;

/// Contents written into a lock file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockOwner {
    token: Uuid,
    pid: u32,
    acquired_at: String,
}

/// Guard for a held stage lock. The lock is released on drop.
#[derive(Debug)]
pub struct StageLock {
    stage: Stage,
    path: PathBuf,
    token: Uuid,
}

impl StageLock {
    /// Acquires the lock for `stage` under `root`.
    ///
    /// A lock file older than `stale_after` is assumed to belong to a crashed
    /// invocation and is reclaimed.
    pub fn acquire(root: &Path, stage: Stage, stale_after: Duration) -> Result<Self> {
        fs::create_dir_all(root)?;
        let path = Self::lock_path(root, stage);
        let token = Uuid::new_v4();

        match Self::create(&path, token) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let Some(observed) = Self::stale_owner(&path, stale_after) else {
                    return Err(Self::locked(stage, path));
                };
                warn!(stage = %stage, path = %path.display(), "Reclaiming stale stage lock");
                Self::reclaim(&path, stage, token, observed.as_ref(), stale_after)?;
            }
            Err(e) => return Err(e.into()),
        }

        debug!(stage = %stage, path = %path.display(), "Acquired stage lock");
        Ok(Self { stage, path, token })
    }

    /// Path of the lock file for `stage`.
    #[must_use]
    pub fn lock_path(root: &Path, stage: Stage) -> PathBuf {
        root.join(format!(".{}.lock", stage.as_str()))
    }

    /// The locked stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Releases the lock now instead of on drop.
    pub fn release(self) {
        drop(self);
    }

    /// Replaces a stale lock file with one owned by `token`.
    ///
    /// The stale file is first renamed aside. Only one contender's rename can
    /// succeed, and whatever was renamed is checked again: if it is no longer
    /// the stale file `observed` described, it is put back and the stage
    /// counts as locked.
    fn reclaim(
        path: &Path,
        stage: Stage,
        token: Uuid,
        observed: Option<&Uuid>,
        stale_after: Duration,
    ) -> Result<()> {
        let aside = Self::aside_path(path, token, "stale");
        match fs::rename(path, &aside) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Self::locked(stage, path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        }

        let unchanged = Self::stale_owner(&aside, stale_after)
            .is_some_and(|owner| owner.as_ref() == observed);
        if !unchanged {
            Self::restore(&aside, path, stage);
            return Err(Self::locked(stage, path.to_path_buf()));
        }
        Self::discard(&aside, stage);

        Self::create(path, token).map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                Self::locked(stage, path.to_path_buf())
            } else {
                e.into()
            }
        })
    }

    fn create(path: &Path, token: Uuid) -> io::Result<()> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        let owner = LockOwner {
            token,
            pid: std::process::id(),
            acquired_at: iso_timestamp(),
        };
        let body = serde_json::to_vec(&owner).map_err(io::Error::other)?;
        file.write_all(&body)
    }

    /// The owner token of a lock file older than `stale_after`.
    ///
    /// The outer `None` means the file is missing or still fresh; the inner
    /// one means its body carries no readable owner.
    fn stale_owner(path: &Path, stale_after: Duration) -> Option<Option<Uuid>> {
        let age = fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()?
            .elapsed()
            .ok()?;
        (age > stale_after).then(|| Self::owner_token(path))
    }

    fn owner_token(path: &Path) -> Option<Uuid> {
        fs::read(path)
            .ok()
            .and_then(|body| serde_json::from_slice::<LockOwner>(&body).ok())
            .map(|owner| owner.token)
    }

    fn aside_path(path: &Path, token: Uuid, purpose: &str) -> PathBuf {
        let mut name = path.file_name().map(OsString::from).unwrap_or_default();
        name.push(format!(".{token}.{purpose}"));
        path.with_file_name(name)
    }

    /// Moves a renamed-aside lock back unless a new lock already took its place.
    fn restore(aside: &Path, path: &Path, stage: Stage) {
        match fs::hard_link(aside, path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!(stage = %stage, "Stage lock was replaced while set aside");
            }
            Err(e) => {
                warn!(stage = %stage, error = %e, "Failed to restore stage lock");
                return;
            }
        }
        Self::discard(aside, stage);
    }

    fn discard(aside: &Path, stage: Stage) {
        if let Err(e) = fs::remove_file(aside) {
            warn!(stage = %stage, path = %aside.display(), error = %e, "Failed to remove set-aside lock");
        }
    }

    fn locked(stage: Stage, lock_path: PathBuf) -> FeedflowError {
        FeedflowError::StageLocked {
            stage: stage.to_string(),
            lock_path,
        }
    }
}

impl Drop for StageLock {
    fn drop(&mut self) {
        let aside = Self::aside_path(&self.path, self.token, "release");
        if let Err(e) = fs::rename(&self.path, &aside) {
            warn!(stage = %self.stage, error = %e, "Stage lock vanished before release");
            return;
        }
        if Self::owner_token(&aside) == Some(self.token) {
            Self::discard(&aside, self.stage);
            debug!(stage = %self.stage, "Released stage lock");
        } else {
            warn!(stage = %self.stage, "Stage lock was taken over before release");
            Self::restore(&aside, &self.path, self.stage);
        }
    }
}
