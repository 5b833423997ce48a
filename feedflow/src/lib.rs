//! # Feedflow
//!
//! A staged, directory-backed ingestion pipeline for XML product feeds.
//!
//! Items move through four stage directories:
//!
//! - **Raw**: the most recently fetched feed documents
//! - **Process**: one file per feed item, waiting to be transformed
//! - **Processed**: archive of items that have been transformed
//! - **Results**: the single container of every record produced so far
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use feedflow::prelude::*;
//!
//! let config = PipelineConfig::load(None)?;
//! let pipeline = feedflow::pipeline::open(config)?;
//!
//! pipeline.fetch().await?;
//! pipeline.split()?;
//! let report = pipeline.process()?;
//! println!("{} records stored", report.results.total);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod document;
pub mod errors;
pub mod events;
pub mod fetch;
pub mod pipeline;
pub mod results;
pub mod storage;
pub mod testing;
pub mod transform;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{AllowSet, PipelineConfig, Settings};
    pub use crate::errors::{FeedflowError, Result};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::fetch::{FetchContext, FetchSource, Fetcher, SourceFetcher};
    pub use crate::pipeline::{FetchReport, Pipeline, ProcessReport, SplitReport, StatusReport};
    pub use crate::results::ResultAccumulator;
    pub use crate::storage::{Extension, FsStageStore, Stage, StageStore, StagedItem};
    pub use crate::transform::{convert, LocalizedText, Record};
    pub use crate::utils::{iso_timestamp, Timestamp};
}
