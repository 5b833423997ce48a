//! Fetch collaborators.
//!
//! This module provides:
//! - Fetch contexts that turn configuration into request options
//! - The [`Fetcher`] trait the pipeline fetches through
//! - HTTP and local-file fetchers, and a dispatcher choosing between them

mod context;
mod file;
#[cfg(feature = "http")]
mod http;
mod source;

pub use context::{FetchContext, FetchRequest, FetchSource, RequestOptions};
pub use file::FileFetcher;
#[cfg(feature = "http")]
pub use http::HttpFetcher;
pub use source::{SourceFetcher, SourceKind};

use async_trait::async_trait;

use crate::errors::Result;

/// Retrieves the raw content of a feed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `request` and returns the response body.
    ///
    /// Any failure to obtain the body is a
    /// [`FeedflowError::Transport`](crate::errors::FeedflowError::Transport).
    async fn fetch(&self, request: &FetchRequest) -> Result<String>;
}
