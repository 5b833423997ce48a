//! Error types for the feedflow pipeline.
//!
//! Every validation failure is a typed variant returned from the operation
//! that detected it; nothing is retried internally.

use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience result alias used across the crate.
pub type Result<T> = std::result::Result<T, FeedflowError>;

/// The main error type for feedflow operations.
#[derive(Debug, Error)]
pub enum FeedflowError {
    /// The stage name is not one of the known stages.
    #[error("Invalid stage: '{0}'")]
    InvalidStage(String),

    /// The file extension is not in the allow-list.
    #[error("File extension not allowed: '{0}'")]
    InvalidExtension(String),

    /// A file that was expected to be new already exists.
    #[error("File {} already exists", path.display())]
    FileCollision {
        /// The colliding path.
        path: PathBuf,
    },

    /// A write completed but the file is not present afterwards.
    #[error("Could not save file {}", path.display())]
    WriteVerificationFailed {
        /// The path that was written.
        path: PathBuf,
    },

    /// A document is not well-formed XML.
    #[error("Invalid XML: {0}")]
    ParseFailure(String),

    /// A fetched feed has a top-level item count outside the allow-set.
    #[error("Invalid xml count found: {count} (allowed: {allowed:?})")]
    CountValidationFailed {
        /// The number of top-level items found.
        count: usize,
        /// The configured allow-set.
        allowed: Vec<usize>,
    },

    /// A fetch context was asked for a page size outside its allow-set.
    #[error("Invalid fetch number {requested}, aborting (allowed: {allowed:?})")]
    InvalidFetchSize {
        /// The configured fetch size.
        requested: usize,
        /// The context's allow-set.
        allowed: Vec<usize>,
    },

    /// A pipeline step found nothing to work on.
    #[error("{operation}: no data")]
    EmptyInput {
        /// The operation that found no input.
        operation: &'static str,
    },

    /// The results stage is in a state the pipeline cannot reconcile.
    #[error("Result invariant violated: {0}")]
    ResultInvariantViolation(String),

    /// The results container could not be decoded.
    #[error("Corrupt results container: {0}")]
    CorruptResults(String),

    /// The results container was written by an incompatible encoder.
    #[error("Unsupported results version {found} (expected {expected})")]
    UnsupportedResultsVersion {
        /// The version found in the container.
        found: u32,
        /// The version this build writes.
        expected: u32,
    },

    /// Another invocation holds the lock for a stage.
    #[error("Stage '{stage}' is locked by {}", lock_path.display())]
    StageLocked {
        /// The locked stage.
        stage: String,
        /// The lock file.
        lock_path: PathBuf,
    },

    /// The fetch collaborator failed to retrieve a source.
    #[error("Transport error for {url}: {message}")]
    Transport {
        /// The source URL.
        url: String,
        /// The underlying failure.
        message: String,
    },

    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeedflowError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Creates a parse failure from any displayable parser error.
    #[must_use]
    pub fn parse(err: impl std::fmt::Display) -> Self {
        Self::ParseFailure(err.to_string())
    }

    /// Returns true for errors the pipeline cannot recover from on its own.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ResultInvariantViolation(_))
    }

    /// Stable identifier for logs and events.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidStage(_) => "INVALID_STAGE",
            Self::InvalidExtension(_) => "INVALID_EXTENSION",
            Self::FileCollision { .. } => "FILE_COLLISION",
            Self::WriteVerificationFailed { .. } => "WRITE_VERIFICATION_FAILED",
            Self::ParseFailure(_) => "PARSE_FAILURE",
            Self::CountValidationFailed { .. } => "COUNT_VALIDATION_FAILED",
            Self::InvalidFetchSize { .. } => "INVALID_FETCH_SIZE",
            Self::EmptyInput { .. } => "EMPTY_INPUT",
            Self::ResultInvariantViolation(_) => "RESULT_INVARIANT_VIOLATION",
            Self::CorruptResults(_) => "CORRUPT_RESULTS",
            Self::UnsupportedResultsVersion { .. } => "UNSUPPORTED_RESULTS_VERSION",
            Self::StageLocked { .. } => "STAGE_LOCKED",
            Self::Transport { .. } => "TRANSPORT",
            Self::Config(_) => "CONFIG",
            Self::Serialization(_) => "SERIALIZATION",
            Self::Io(_) => "IO",
        }
    }

    /// Converts to a dictionary representation for event payloads.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), json!(self.code()));
        map.insert("message".to_string(), json!(self.to_string()));
        map.insert("fatal".to_string(), json!(self.is_fatal()));
        map
    }
}

impl From<serde_json::Error> for FeedflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
