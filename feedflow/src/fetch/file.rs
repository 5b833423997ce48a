//! Local file fetcher.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use super::{FetchRequest, Fetcher};
use crate::errors::{FeedflowError, Result};

/// Reads sources given as `file://` URLs or plain paths.
///
/// Request options are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl FileFetcher {
    /// Creates a file fetcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// The filesystem path a source refers to.
    #[must_use]
    pub fn path_of(url: &str) -> &Path {
        Path::new(url.strip_prefix("file://").unwrap_or(url))
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String> {
        let path = Self::path_of(&request.url);
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FeedflowError::transport(&request.url, e))?;
        debug!(path = %path.display(), bytes = content.len(), "Read feed from file");
        Ok(content)
    }
}
