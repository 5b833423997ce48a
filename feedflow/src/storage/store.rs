//! The stage store trait and its file-system implementation.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use super::item::{ItemName, StagedItem};
use super::lock::StageLock;
use super::stage::{Extension, Stage};
use crate::errors::{FeedflowError, Result};

/// Durable queue partitioned into stages.
///
/// The store remembers which files each `load` returned so callers can move
/// or delete exactly that set without re-scanning. This does not protect
/// against other processes writing the same directories; use
/// [`StageStore::lock`] for that.
pub trait StageStore: Send + Sync {
    /// Reads up to `max` non-empty items from `stage` (`0` means all).
    ///
    /// Items come back in directory iteration order, which is unspecified.
    fn load(&self, stage: Stage, max: usize) -> Result<Vec<String>>;

    /// Paths returned by the most recent [`StageStore::load`] of `stage`.
    fn loaded_files(&self, stage: Stage) -> Vec<PathBuf>;

    /// Writes `content` to a freshly named file in `stage`.
    fn save(&self, stage: Stage, content: &str, extension: Extension, new: bool) -> Result<StagedItem>;

    /// Writes `content` to an exact path.
    ///
    /// With `new` set the path must not exist yet.
    fn save_single(&self, path: &Path, content: &str, new: bool) -> Result<()>;

    /// Renames every existing source into `destination` under new names.
    ///
    /// Each source keeps its own extension unchecked, so a move never fails
    /// on a name. Sources that no longer exist are skipped.
    fn move_to(&self, sources: &[PathBuf], destination: Stage) -> Result<Vec<StagedItem>>;

    /// Deletes every existing path, returning how many were removed.
    fn remove(&self, paths: &[PathBuf]) -> Result<usize>;

    /// Every regular file currently in `stage`, sorted by name.
    fn list(&self, stage: Stage) -> Result<Vec<PathBuf>>;

    /// Takes the advisory lock for `stage`.
    fn lock(&self, stage: Stage) -> Result<StageLock>;
}

/// A [`StageStore`] backed by one directory per stage under a root.
#[derive(Debug)]
pub struct FsStageStore {
    root: PathBuf,
    lock_stale_after: Duration,
    loaded: Mutex<HashMap<Stage, Vec<PathBuf>>>,
}

impl FsStageStore {
    /// Creates a store rooted at `root`. Nothing is created on disk yet.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_stale_after: Duration::from_secs(3600),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Sets how old a lock file must be before it is reclaimed.
    #[must_use]
    pub const fn with_lock_stale_after(mut self, stale_after: Duration) -> Self {
        self.lock_stale_after = stale_after;
        self
    }

    /// The storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for `stage`.
    #[must_use]
    pub fn stage_dir(&self, stage: Stage) -> PathBuf {
        self.root.join(stage.dir_name())
    }

    fn ensure_stage_dir(&self, stage: Stage) -> Result<PathBuf> {
        let dir = self.stage_dir(stage);
        if !dir.is_dir() {
            fs::create_dir_all(&dir)?;
            debug!(stage = %stage, dir = %dir.display(), "Created stage directory");
        }
        Ok(dir)
    }

    fn read_item(path: &Path) -> Option<String> {
        if !path.is_file() {
            return None;
        }
        match fs::read_to_string(path) {
            Ok(content) if content.is_empty() => {
                debug!(path = %path.display(), "Skipping empty stage item");
                None
            }
            Ok(content) => Some(content),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable stage item");
                None
            }
        }
    }
}

impl StageStore for FsStageStore {
    fn load(&self, stage: Stage, max: usize) -> Result<Vec<String>> {
        let dir = self.stage_dir(stage);
        let mut contents = Vec::new();
        let mut loaded = Vec::new();

        if dir.is_dir() {
            // Snapshot the entries first so `max = 0` means "what was there".
            let entries: Vec<PathBuf> = fs::read_dir(&dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .collect();
            let limit = if max == 0 { entries.len() } else { max };

            for path in entries {
                if contents.len() >= limit {
                    break;
                }
                if let Some(content) = Self::read_item(&path) {
                    contents.push(content);
                    loaded.push(path);
                }
            }
        }

        debug!(stage = %stage, count = contents.len(), max, "Loaded stage items");
        self.loaded.lock().insert(stage, loaded);
        Ok(contents)
    }

    fn loaded_files(&self, stage: Stage) -> Vec<PathBuf> {
        self.loaded.lock().get(&stage).cloned().unwrap_or_default()
    }

    fn save(&self, stage: Stage, content: &str, extension: Extension, new: bool) -> Result<StagedItem> {
        let dir = self.ensure_stage_dir(stage)?;
        let name = ItemName::generate(stage, extension);
        let path = dir.join(name.to_string());

        self.save_single(&path, content, new)?;
        debug!(stage = %stage, path = %path.display(), bytes = content.len(), "Saved stage item");
        Ok(StagedItem::new(stage, path, extension.as_str()))
    }

    fn save_single(&self, path: &Path, content: &str, new: bool) -> Result<()> {
        if new {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .map_err(|e| {
                    if e.kind() == io::ErrorKind::AlreadyExists {
                        FeedflowError::FileCollision {
                            path: path.to_path_buf(),
                        }
                    } else {
                        e.into()
                    }
                })?;
            file.write_all(content.as_bytes())?;
        } else {
            fs::write(path, content)?;
        }

        if !path.is_file() {
            return Err(FeedflowError::WriteVerificationFailed {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn move_to(&self, sources: &[PathBuf], destination: Stage) -> Result<Vec<StagedItem>> {
        let dir = self.ensure_stage_dir(destination)?;
        let mut moved = Vec::with_capacity(sources.len());

        for source in sources {
            if !source.exists() {
                debug!(path = %source.display(), "Move source vanished, skipping");
                continue;
            }
            let extension = source
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_default();
            let target = dir.join(ItemName::renamed(destination, source));
            fs::rename(source, &target)?;
            moved.push(StagedItem::new(destination, target, extension));
        }

        debug!(destination = %destination, count = moved.len(), "Moved stage items");
        Ok(moved)
    }

    fn remove(&self, paths: &[PathBuf]) -> Result<usize> {
        let mut removed = 0;
        for path in paths {
            match fs::remove_file(path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }

    fn list(&self, stage: Stage) -> Result<Vec<PathBuf>> {
        let dir = self.stage_dir(stage);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    fn lock(&self, stage: Stage) -> Result<StageLock> {
        StageLock::acquire(&self.root, stage, self.lock_stale_after)
    }
}
