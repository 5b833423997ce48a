//! Fetch, split and process over a stage store.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

use super::report::{
    FetchReport, FetchedSource, ProcessReport, SplitReport, StageCount, StatusReport,
};
use crate::config::PipelineConfig;
use crate::document::{count_items, split_children};
use crate::errors::{FeedflowError, Result};
use crate::events::{names, EventSink, NoOpEventSink};
use crate::fetch::{Fetcher, SourceFetcher};
use crate::results::ResultAccumulator;
use crate::storage::{Extension, FsStageStore, ItemName, Stage, StageLock, StageStore};
use crate::transform::{convert, Record};

/// Builds the production pipeline for `config`: a file-system store rooted
/// at `STORAGE_ROOT` and the scheme-dispatching fetcher.
pub fn open(config: PipelineConfig) -> Result<Pipeline<FsStageStore, SourceFetcher>> {
    let store = FsStageStore::new(&config.storage_root)
        .with_lock_stale_after(config.lock_stale_after);
    let fetcher = SourceFetcher::new(&config)?;
    Ok(Pipeline::new(config, store, fetcher))
}

/// Drives items through the stages.
///
/// Every operation fails fast: the first error is returned and files already
/// written stay where they are.
pub struct Pipeline<S, F> {
    config: PipelineConfig,
    store: S,
    fetcher: F,
    events: Arc<dyn EventSink>,
}

impl<S: StageStore, F: Fetcher> Pipeline<S, F> {
    /// Creates a pipeline that discards events.
    pub fn new(config: PipelineConfig, store: S, fetcher: F) -> Self {
        Self {
            config,
            store,
            fetcher,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the sink receiving pipeline events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// The configuration in use.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The fetcher serving source requests.
    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Replaces the raw stage with freshly fetched feeds.
    ///
    /// Each source's item count must be in `ALLOWED_FETCH_NUMBER`. Sources
    /// stored before a failing one are kept.
    pub async fn fetch(&self) -> Result<FetchReport> {
        self.events
            .emit(
                names::FETCH_STARTED,
                Some(json!({ "sources": self.config.sources.len() })),
            )
            .await;
        let result = self.run_fetch().await;
        self.emit_outcome(names::FETCH_COMPLETED, names::FETCH_FAILED, &result);
        result
    }

    /// Splits every raw feed into one process item per top-level element.
    ///
    /// Holds both the raw and the process lock while writing.
    pub fn split(&self) -> Result<SplitReport> {
        let result = self.run_split();
        self.emit_outcome(names::SPLIT_COMPLETED, names::SPLIT_FAILED, &result);
        result
    }

    /// Transforms up to `MAX_PROCESS_PER_CYCLE` pending items, merges their
    /// records into the result container and archives them.
    pub fn process(&self) -> Result<ProcessReport> {
        let result = self.run_process();
        self.emit_outcome(names::PROCESS_COMPLETED, names::PROCESS_FAILED, &result);
        result
    }

    /// Per-stage counts and the size of the result container.
    pub fn status(&self) -> Result<StatusReport> {
        let mut stages = Vec::with_capacity(Stage::ALL.len());
        let mut oldest_pending = None;
        for stage in Stage::ALL {
            let files = self.store.list(stage)?;
            if stage == Stage::Process {
                oldest_pending = files
                    .iter()
                    .filter_map(|path| ItemName::from_path(path))
                    .map(|name| name.date)
                    .min();
            }
            stages.push(StageCount {
                stage,
                files: files.len(),
            });
        }

        let result_records = ResultAccumulator::new(&self.store)
            .read()?
            .map_or(0, |existing| existing.records.len());

        Ok(StatusReport {
            generated_at: Utc::now(),
            stages,
            oldest_pending,
            result_records,
        })
    }

    /// Records in the result container, newest first.
    pub fn results(&self) -> Result<Vec<Record>> {
        Ok(ResultAccumulator::new(&self.store)
            .read()?
            .map(|existing| existing.records)
            .unwrap_or_default())
    }

    async fn run_fetch(&self) -> Result<FetchReport> {
        let started_at = Utc::now();
        let _lock = self.lock(Stage::Raw)?;

        self.store.load(Stage::Raw, 0)?;
        let cleared = self.store.remove(&self.store.loaded_files(Stage::Raw))?;
        if cleared > 0 {
            debug!(cleared, "Removed previous raw feeds");
        }

        let mut sources = Vec::with_capacity(self.config.sources.len());
        for source in &self.config.sources {
            let request = source.request(&self.config)?;
            let content = self.fetcher.fetch(&request).await?;

            let count = count_items(&content)?;
            if !self.config.allowed_fetch_numbers.contains(count) {
                warn!(
                    url = %source.url,
                    count,
                    allowed = %self.config.allowed_fetch_numbers,
                    "Rejecting feed with unexpected item count"
                );
                return Err(FeedflowError::CountValidationFailed {
                    count,
                    allowed: self.config.allowed_fetch_numbers.to_vec(),
                });
            }

            let item = self.store.save(Stage::Raw, &content, Extension::Xml, true)?;
            info!(url = %source.url, items = count, path = %item.path.display(), "Stored feed");
            self.events
                .emit(
                    names::FETCH_SOURCE_STORED,
                    Some(json!({
                        "url": source.url,
                        "items": count,
                        "path": item.path.display().to_string(),
                    })),
                )
                .await;
            sources.push(FetchedSource {
                url: source.url.clone(),
                items: count,
                path: item.path,
            });
        }

        Ok(FetchReport {
            started_at,
            finished_at: Utc::now(),
            cleared,
            sources,
        })
    }

    fn run_split(&self) -> Result<SplitReport> {
        let started_at = Utc::now();
        let _lock = self.lock(Stage::Raw)?;

        let documents = self.store.load(Stage::Raw, 0)?;
        if documents.is_empty() {
            return Err(FeedflowError::EmptyInput { operation: "split" });
        }
        // Raw before process, the same order `process` takes process before results.
        let _process_lock = self.lock(Stage::Process)?;

        let throttle = self.config.split_throttle;
        let mut items = Vec::new();
        for document in &documents {
            for fragment in split_children(document)? {
                if !items.is_empty() && !throttle.is_zero() {
                    thread::sleep(throttle);
                }
                let item = self.store.save(Stage::Process, &fragment, Extension::Xml, true)?;
                debug!(path = %item.path.display(), "Queued item");
                items.push(item.path);
            }
        }

        info!(documents = documents.len(), items = items.len(), "Split raw feeds");
        Ok(SplitReport {
            started_at,
            finished_at: Utc::now(),
            documents: documents.len(),
            items,
        })
    }

    fn run_process(&self) -> Result<ProcessReport> {
        let started_at = Utc::now();
        let _process_lock = self.lock(Stage::Process)?;

        let contents = self
            .store
            .load(Stage::Process, self.config.max_process_per_cycle)?;
        if contents.is_empty() {
            return Err(FeedflowError::EmptyInput { operation: "process" });
        }
        let consumed = self.store.loaded_files(Stage::Process);

        let mut records = Vec::with_capacity(contents.len());
        for (content, path) in contents.iter().zip(&consumed) {
            let record = convert(content).map_err(|e| {
                warn!(path = %path.display(), error = %e, "Item could not be converted");
                e
            })?;
            records.push(record);
        }

        let _results_lock = self.lock(Stage::Results)?;
        let results = ResultAccumulator::new(&self.store).merge(records)?;
        let archived = self
            .store
            .move_to(&consumed, Stage::Processed)?
            .into_iter()
            .map(|item| item.path)
            .collect();

        info!(
            processed = contents.len(),
            total_records = results.total,
            "Processed items"
        );
        Ok(ProcessReport {
            started_at,
            finished_at: Utc::now(),
            processed: contents.len(),
            results,
            archived,
        })
    }

    fn lock(&self, stage: Stage) -> Result<Option<StageLock>> {
        if self.config.stage_locking {
            self.store.lock(stage).map(Some)
        } else {
            Ok(None)
        }
    }

    fn emit_outcome<T: Serialize>(&self, completed: &str, failed: &str, result: &Result<T>) {
        match result {
            Ok(report) => self
                .events
                .try_emit(completed, serde_json::to_value(report).ok()),
            Err(e) => self
                .events
                .try_emit(failed, serde_json::to_value(e.to_dict()).ok()),
        }
    }
}

impl<S, F> std::fmt::Debug for Pipeline<S, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
