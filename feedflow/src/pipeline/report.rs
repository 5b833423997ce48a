//! Outcome reports returned by pipeline operations.

use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;

use crate::results::MergeOutcome;
use crate::storage::Stage;
use crate::utils::Timestamp;

/// One source stored by a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedSource {
    /// Source URL.
    pub url: String,
    /// Top-level items in the fetched feed.
    pub items: usize,
    /// Where the feed was stored in the raw stage.
    pub path: PathBuf,
}

/// Outcome of [`Pipeline::fetch`](super::Pipeline::fetch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    /// When the operation started.
    pub started_at: Timestamp,
    /// When the operation finished.
    pub finished_at: Timestamp,
    /// Previous raw files removed before fetching.
    pub cleared: usize,
    /// Stored sources, in configuration order.
    pub sources: Vec<FetchedSource>,
}

/// Outcome of [`Pipeline::split`](super::Pipeline::split).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitReport {
    /// When the operation started.
    pub started_at: Timestamp,
    /// When the operation finished.
    pub finished_at: Timestamp,
    /// Raw documents split.
    pub documents: usize,
    /// Item files written to the process stage.
    pub items: Vec<PathBuf>,
}

/// Outcome of [`Pipeline::process`](super::Pipeline::process).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    /// When the operation started.
    pub started_at: Timestamp,
    /// When the operation finished.
    pub finished_at: Timestamp,
    /// Items transformed in this cycle.
    pub processed: usize,
    /// The result container after the merge.
    pub results: MergeOutcome,
    /// New locations of the consumed items in the processed stage.
    pub archived: Vec<PathBuf>,
}

/// File count of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageCount {
    /// The stage.
    pub stage: Stage,
    /// Regular files currently in it.
    pub files: usize,
}

/// Snapshot returned by [`Pipeline::status`](super::Pipeline::status).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// When the snapshot was taken.
    pub generated_at: Timestamp,
    /// Per-stage file counts, in pipeline order.
    pub stages: Vec<StageCount>,
    /// Date of the oldest item waiting in the process stage.
    pub oldest_pending: Option<NaiveDate>,
    /// Records in the result container.
    pub result_records: usize,
}

impl StatusReport {
    /// File count for `stage`.
    #[must_use]
    pub fn files_in(&self, stage: Stage) -> usize {
        self.stages
            .iter()
            .find(|count| count.stage == stage)
            .map_or(0, |count| count.files)
    }
}
