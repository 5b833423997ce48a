//! HTTP fetcher built on `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::{debug, info};

use super::{FetchRequest, Fetcher};
use crate::errors::{FeedflowError, Result};

/// User agent sent with every request.
const USER_AGENT: &str = concat!("feedflow/", env!("CARGO_PKG_VERSION"));

/// Fetches `http://` and `https://` sources.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FeedflowError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String> {
        let options = &request.options;
        let method = Method::from_bytes(options.method.as_bytes())
            .map_err(|e| FeedflowError::transport(&request.url, e))?;

        let mut builder = self
            .client
            .request(method, &request.url)
            .query(&options.query);
        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        info!(url = %request.url, method = %options.method, "Fetching feed");
        let response = builder
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| FeedflowError::transport(&request.url, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FeedflowError::transport(&request.url, e))?;

        debug!(url = %request.url, status = %status, bytes = body.len(), "Fetched feed");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RequestOptions;

    #[test]
    fn test_client_builds_with_timeout() {
        assert!(HttpFetcher::new(Duration::from_secs(5)).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_method_is_transport_error() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        let mut options = RequestOptions::get();
        options.method = "NOT A METHOD".to_string();
        let request = FetchRequest {
            url: "http://127.0.0.1:9/feed.xml".to_string(),
            options,
        };

        let err = fetcher.fetch(&request).await.unwrap_err();
        assert!(matches!(err, FeedflowError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
        let request = FetchRequest {
            url: "http://127.0.0.1:9/feed.xml".to_string(),
            options: RequestOptions::get(),
        };

        let err = fetcher.fetch(&request).await.unwrap_err();
        assert!(matches!(err, FeedflowError::Transport { .. }));
    }
}
