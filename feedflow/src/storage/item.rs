//! Stage item naming.
//!
//! Items are named `{stage}_{YYYY_MM_DD}_{tick}.{extension}`. The tick is a
//! per-process strictly increasing microsecond value, so two names generated
//! by the same process never repeat.

use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::stage::{Extension, Stage};
use crate::utils::timestamps::{date_stamp, next_tick, parse_date_stamp, Timestamp};

/// `None` only if the literal below fails to compile; parsing then matches nothing.
static NAME_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(raw|process|processed|results)_(\d{4}_\d{2}_\d{2})_(\d+)\.(xml|txt)$").ok()
});

/// The parsed form of a generated item filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemName {
    /// Stage the name was generated for.
    pub stage: Stage,
    /// Calendar date component.
    pub date: NaiveDate,
    /// Sub-second tick component.
    pub tick: u64,
    /// File extension.
    pub extension: Extension,
}

impl ItemName {
    /// Generates a fresh name for `stage` at the current time.
    #[must_use]
    pub fn generate(stage: Stage, extension: Extension) -> Self {
        Self::generate_at(stage, extension, &Utc::now())
    }

    /// Generates a fresh name for `stage` as if the clock read `now`.
    #[must_use]
    pub fn generate_at(stage: Stage, extension: Extension, now: &Timestamp) -> Self {
        Self {
            stage,
            date: now.date_naive(),
            tick: next_tick(now),
            extension,
        }
    }

    /// Parses a filename produced by [`ItemName::generate`].
    #[must_use]
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = NAME_PATTERN.as_ref()?.captures(file_name)?;
        Some(Self {
            stage: caps[1].parse().ok()?,
            date: parse_date_stamp(&caps[2])?,
            tick: caps[3].parse().ok()?,
            extension: caps[4].parse().ok()?,
        })
    }

    /// A fresh file name in `stage` for an existing file.
    ///
    /// The source's extension is kept byte for byte, including its case, and
    /// a source without one yields a name without a dot.
    #[must_use]
    pub fn renamed(stage: Stage, source: &Path) -> OsString {
        let now = Utc::now();
        let mut name = OsString::from(format!(
            "{}_{}_{}",
            stage,
            date_stamp(now.date_naive()),
            next_tick(&now)
        ));
        if let Some(extension) = source.extension() {
            name.push(".");
            name.push(extension);
        }
        name
    }

    /// Parses the filename component of `path`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name().and_then(|n| n.to_str()).and_then(Self::parse)
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}.{}",
            self.stage,
            date_stamp(self.date),
            self.tick,
            self.extension
        )
    }
}

/// A file that lives in a stage directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedItem {
    /// The stage holding the file.
    pub stage: Stage,
    /// Full path of the file.
    pub path: PathBuf,
    /// The file's extension, empty when it has none.
    ///
    /// Saved items always carry an allowed [`Extension`]; moved items keep
    /// whatever their source had.
    pub extension: String,
}

impl StagedItem {
    /// Creates a new staged item.
    #[must_use]
    pub fn new(stage: Stage, path: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            stage,
            path: path.into(),
            extension: extension.into(),
        }
    }
}
