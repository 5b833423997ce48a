//! Fetch contexts and request options.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::config::PipelineConfig;
use crate::errors::{FeedflowError, Result};

/// Query parameter carrying the marker page size.
const TOTAL_PARAM: &str = "total";

/// How a source is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchContext {
    /// The marker backend: a paged XML export.
    Marker,
    /// A plain GET without extras.
    Plain,
}

impl FetchContext {
    /// Name used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Marker => "marker",
            Self::Plain => "plain",
        }
    }

    /// Builds the request options for this context.
    ///
    /// The marker context requests `MARKER_ACTIVE_FETCH_NUMBER` items and
    /// fails with [`FeedflowError::InvalidFetchSize`] when that number is not
    /// in `MARKER_ALLOWED_FETCH_NUMBER`.
    pub fn build_request_options(self, config: &PipelineConfig) -> Result<RequestOptions> {
        match self {
            Self::Plain => Ok(RequestOptions::get()),
            Self::Marker => {
                let marker = &config.marker;
                if !marker.allowed_fetch_numbers.contains(marker.active_fetch_number) {
                    return Err(FeedflowError::InvalidFetchSize {
                        requested: marker.active_fetch_number,
                        allowed: marker.allowed_fetch_numbers.to_vec(),
                    });
                }
                Ok(RequestOptions::get()
                    .with_header("Content-Type", "application/xml")
                    .with_query(TOTAL_PARAM, marker.active_fetch_number.to_string()))
            }
        }
    }
}

impl fmt::Display for FetchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FetchContext {
    type Err = FeedflowError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "marker" => Ok(Self::Marker),
            "plain" => Ok(Self::Plain),
            other => Err(FeedflowError::Config(format!(
                "unknown fetch context '{other}' (expected 'marker' or 'plain')"
            ))),
        }
    }
}

/// Method, headers and query parameters of a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestOptions {
    /// HTTP method name.
    pub method: String,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Query parameters appended to the URL.
    pub query: BTreeMap<String, String>,
}

impl RequestOptions {
    /// A bare GET.
    #[must_use]
    pub fn get() -> Self {
        Self {
            method: "GET".to_string(),
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }
}

/// A resolved request for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchRequest {
    /// Source URL or path.
    pub url: String,
    /// Options built by the source's context.
    pub options: RequestOptions,
}

/// A configured feed source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchSource {
    /// URL (`http(s)://`, `file://`) or local path.
    pub url: String,
    /// Context the source is requested with.
    pub context: FetchContext,
}

impl FetchSource {
    /// Creates a source.
    #[must_use]
    pub fn new(url: impl Into<String>, context: FetchContext) -> Self {
        Self {
            url: url.into(),
            context,
        }
    }

    /// Resolves the request for this source.
    pub fn request(&self, config: &PipelineConfig) -> Result<FetchRequest> {
        Ok(FetchRequest {
            url: self.url.clone(),
            options: self.context.build_request_options(config)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllowSet;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_marker_context_requests_active_page_size() {
        let config = PipelineConfig::default();
        let options = FetchContext::Marker.build_request_options(&config).unwrap();

        assert_eq!(options.method, "GET");
        assert_eq!(options.headers["Content-Type"], "application/xml");
        assert_eq!(options.query["total"], "20");
    }

    #[test]
    fn test_marker_context_rejects_size_outside_allow_set() {
        let mut config = PipelineConfig::default();
        config.marker.active_fetch_number = 21;

        let err = FetchContext::Marker.build_request_options(&config).unwrap_err();
        assert!(matches!(
            err,
            FeedflowError::InvalidFetchSize { requested: 21, ref allowed } if allowed == &vec![20, 200, 2000]
        ));
    }

    #[test]
    fn test_marker_check_ignores_feed_allow_set() {
        let config = PipelineConfig::default().with_allowed_fetch_numbers(AllowSet::new([3]));
        assert!(FetchContext::Marker.build_request_options(&config).is_ok());
    }

    #[test]
    fn test_plain_context_has_no_extras() {
        let options = FetchContext::Plain
            .build_request_options(&PipelineConfig::default())
            .unwrap();
        assert_eq!(options, RequestOptions::get());
    }

    #[test]
    fn test_context_names() {
        assert_eq!(" Marker ".parse::<FetchContext>().unwrap(), FetchContext::Marker);
        assert_eq!(FetchContext::Plain.to_string(), "plain");
        assert!(matches!("soap".parse::<FetchContext>(), Err(FeedflowError::Config(_))));
    }

    #[test]
    fn test_source_request_carries_url() {
        let source = FetchSource::new("file:///tmp/feed.xml", FetchContext::Plain);
        let request = source.request(&PipelineConfig::default()).unwrap();
        assert_eq!(request.url, "file:///tmp/feed.xml");
    }
}
