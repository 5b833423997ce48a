//! Merging records into the single result container.

use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

use super::codec::{decode, encode};
use crate::errors::{FeedflowError, Result};
use crate::storage::{Extension, Stage, StageStore};
use crate::transform::Record;

/// The container currently stored in the results stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingResults {
    /// Path of the container file.
    pub path: PathBuf,
    /// Records it holds, newest first.
    pub records: Vec<Record>,
}

/// What a merge did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    /// Path of the container after the merge.
    pub path: PathBuf,
    /// Records added by this merge.
    pub added: usize,
    /// Records in the container after the merge.
    pub total: usize,
    /// Whether the container was created by this merge.
    pub created: bool,
}

/// Owns the read-merge-rewrite cycle of the result container.
#[derive(Debug)]
pub struct ResultAccumulator<'a, S: StageStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: StageStore + ?Sized> ResultAccumulator<'a, S> {
    /// Creates an accumulator over `store`.
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Reads the current container, enforcing the one-container invariant.
    ///
    /// An empty container file counts as a container with no records.
    pub fn read(&self) -> Result<Option<ExistingResults>> {
        let files = self.store.list(Stage::Results)?;
        if files.len() > 1 {
            return Err(FeedflowError::ResultInvariantViolation(format!(
                "there should be only one results file, {} detected",
                files.len()
            )));
        }
        let Some(path) = files.into_iter().next() else {
            return Ok(None);
        };

        let contents = self.store.load(Stage::Results, 0)?;
        let loaded = self.store.loaded_files(Stage::Results);
        if contents.len() > 1 || loaded.len() > 1 {
            return Err(FeedflowError::ResultInvariantViolation(format!(
                "there should be only one results file loaded, {} detected",
                loaded.len()
            )));
        }

        let records = match contents.first() {
            Some(content) => decode(content)?,
            None => {
                debug!(path = %path.display(), "Results file is empty");
                Vec::new()
            }
        };
        Ok(Some(ExistingResults { path, records }))
    }

    /// Merges `records` into the container, new records first.
    pub fn merge(&self, records: Vec<Record>) -> Result<MergeOutcome> {
        let added = records.len();
        let outcome = match self.read()? {
            None => {
                let item = self
                    .store
                    .save(Stage::Results, &encode(&records)?, Extension::Txt, true)?;
                MergeOutcome {
                    path: item.path,
                    added,
                    total: added,
                    created: true,
                }
            }
            Some(existing) => {
                let mut merged = records;
                merged.extend(existing.records);
                self.store
                    .save_single(&existing.path, &encode(&merged)?, false)?;
                MergeOutcome {
                    path: existing.path,
                    added,
                    total: merged.len(),
                    created: false,
                }
            }
        };

        info!(
            path = %outcome.path.display(),
            added = outcome.added,
            total = outcome.total,
            created = outcome.created,
            "Merged records into results"
        );
        Ok(outcome)
    }
}
