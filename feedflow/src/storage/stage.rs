//! Stage and extension enums.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::FeedflowError;

/// A named queue partition backed by one directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// The most recent fetched feed, at most one live fetch at a time.
    Raw,
    /// Items waiting to be transformed.
    Process,
    /// Archive of items that have been transformed.
    Processed,
    /// The single result container.
    Results,
}

impl Stage {
    /// Every stage, in pipeline order.
    pub const ALL: [Self; 4] = [Self::Raw, Self::Process, Self::Processed, Self::Results];

    /// The stage name as used in filenames.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Process => "process",
            Self::Processed => "processed",
            Self::Results => "results",
        }
    }

    /// The directory holding this stage, relative to the storage root.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Raw => "Raw",
            Self::Process => "Process",
            Self::Processed => "Processed",
            Self::Results => "Results",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = FeedflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| FeedflowError::InvalidStage(s.to_string()))
    }
}

/// File extensions a stage item may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extension {
    /// An XML document.
    Xml,
    /// Plain text, used for the result container.
    Txt,
}

impl Extension {
    /// The extension without the leading dot.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Extension {
    type Err = FeedflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xml" => Ok(Self::Xml),
            "txt" => Ok(Self::Txt),
            other => Err(FeedflowError::InvalidExtension(other.to_string())),
        }
    }
}
