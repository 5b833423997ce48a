//! Dispatch of sources to the fetcher for their scheme.

use async_trait::async_trait;

use super::{FetchRequest, Fetcher, FileFetcher};
use crate::config::PipelineConfig;
use crate::errors::{FeedflowError, Result};

#[cfg(feature = "http")]
use super::HttpFetcher;

/// Where a source URL points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `http://` or `https://`.
    Http,
    /// `file://` or a path without a scheme.
    File,
    /// Any other scheme.
    Unsupported,
}

impl SourceKind {
    /// Classifies `url` by its scheme.
    #[must_use]
    pub fn of(url: &str) -> Self {
        let Some((scheme, _)) = url.split_once("://") else {
            return Self::File;
        };
        match scheme.to_ascii_lowercase().as_str() {
            "http" | "https" => Self::Http,
            "file" => Self::File,
            _ => Self::Unsupported,
        }
    }
}

/// The production fetcher: HTTP sources over the network, everything else
/// from the local filesystem.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    #[cfg(feature = "http")]
    http: HttpFetcher,
    file: FileFetcher,
}

impl SourceFetcher {
    /// Creates the fetcher using the configured HTTP timeout.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        #[cfg(not(feature = "http"))]
        let _ = config;
        Ok(Self {
            #[cfg(feature = "http")]
            http: HttpFetcher::new(config.fetch_timeout)?,
            file: FileFetcher::new(),
        })
    }
}

#[async_trait]
impl Fetcher for SourceFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String> {
        match SourceKind::of(&request.url) {
            #[cfg(feature = "http")]
            SourceKind::Http => self.http.fetch(request).await,
            #[cfg(not(feature = "http"))]
            SourceKind::Http => Err(FeedflowError::transport(
                &request.url,
                "HTTP support is disabled in this build",
            )),
            SourceKind::File => self.file.fetch(request).await,
            SourceKind::Unsupported => Err(FeedflowError::transport(
                &request.url,
                "unsupported URL scheme",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RequestOptions;
    use tempfile::TempDir;

    #[test]
    fn test_source_kind_by_scheme() {
        assert_eq!(SourceKind::of("http://example.com/a.xml"), SourceKind::Http);
        assert_eq!(SourceKind::of("HTTPS://example.com/a.xml"), SourceKind::Http);
        assert_eq!(SourceKind::of("file:///tmp/a.xml"), SourceKind::File);
        assert_eq!(SourceKind::of("feeds/a.xml"), SourceKind::File);
        assert_eq!(SourceKind::of("ftp://example.com/a.xml"), SourceKind::Unsupported);
    }

    #[tokio::test]
    async fn test_dispatches_file_sources() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.xml");
        std::fs::write(&path, "<items><item/></items>").unwrap();

        let fetcher = SourceFetcher::new(&PipelineConfig::default()).unwrap();
        let request = FetchRequest {
            url: format!("file://{}", path.display()),
            options: RequestOptions::get(),
        };
        assert_eq!(fetcher.fetch(&request).await.unwrap(), "<items><item/></items>");
    }

    #[tokio::test]
    async fn test_unsupported_scheme_is_transport_error() {
        let fetcher = SourceFetcher::new(&PipelineConfig::default()).unwrap();
        let request = FetchRequest {
            url: "ftp://example.com/feed.xml".to_string(),
            options: RequestOptions::get(),
        };
        assert!(matches!(
            fetcher.fetch(&request).await,
            Err(FeedflowError::Transport { .. })
        ));
    }
}
