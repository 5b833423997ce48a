//! Pipeline events.
//!
//! The controller reports `fetch.*`, `split.*` and `process.*` events with
//! JSON payloads to an [`EventSink`]. Sinks never fail the operation that
//! emits into them.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event type names emitted by the pipeline.
pub mod names {
    /// A fetch began.
    pub const FETCH_STARTED: &str = "fetch.started";
    /// One source was fetched and stored.
    pub const FETCH_SOURCE_STORED: &str = "fetch.source_stored";
    /// A fetch finished.
    pub const FETCH_COMPLETED: &str = "fetch.completed";
    /// A fetch failed.
    pub const FETCH_FAILED: &str = "fetch.failed";
    /// A split finished.
    pub const SPLIT_COMPLETED: &str = "split.completed";
    /// A split failed.
    pub const SPLIT_FAILED: &str = "split.failed";
    /// A process cycle finished.
    pub const PROCESS_COMPLETED: &str = "process.completed";
    /// A process cycle failed.
    pub const PROCESS_FAILED: &str = "process.failed";
}
