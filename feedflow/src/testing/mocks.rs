//! Fetcher doubles.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::{FeedflowError, Result};
use crate::fetch::{FetchRequest, Fetcher};

/// Serves the same body for every request and records the requests.
#[derive(Debug)]
pub struct StaticFetcher {
    body: String,
    requests: Mutex<Vec<FetchRequest>>,
}

impl StaticFetcher {
    /// Creates a fetcher answering every request with `body`.
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String> {
        self.requests.lock().push(request.clone());
        Ok(self.body.clone())
    }
}

/// Fails every request with a transport error.
#[derive(Debug, Clone)]
pub struct FailingFetcher {
    message: String,
}

impl FailingFetcher {
    /// Creates a fetcher failing with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Fetcher for FailingFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String> {
        Err(FeedflowError::transport(&request.url, &self.message))
    }
}
