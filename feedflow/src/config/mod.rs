//! Pipeline configuration.
//!
//! Settings are plain key/value strings with documented defaults. They are
//! read once at start-up into a [`PipelineConfig`] that every component
//! borrows; nothing reads configuration lazily afterwards.

mod allow_set;
mod settings;

pub use allow_set::AllowSet;
pub use settings::Settings;

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::errors::{FeedflowError, Result};
use crate::fetch::{FetchContext, FetchSource};

/// Configuration file read when none is named explicitly.
pub const DEFAULT_CONFIG_FILE: &str = "feedflow.toml";

/// Setting keys and their defaults.
pub mod keys {
    /// Root directory holding the stage directories.
    pub const STORAGE_ROOT: (&str, &str) = ("STORAGE_ROOT", "Resources");
    /// Items transformed per `process` call (`0` means all pending).
    pub const MAX_PROCESS_PER_CYCLE: (&str, &str) = ("MAX_PROCESS_PER_CYCLE", "3");
    /// Permitted top-level item counts of a fetched feed.
    pub const ALLOWED_FETCH_NUMBER: (&str, &str) = ("ALLOWED_FETCH_NUMBER", "20,200,2000");
    /// Comma-separated feed URLs.
    pub const FETCH_URLS: (&str, &str) = ("FETCH_URLS", "http://markerdev.info/backend/data2.xml");
    /// Fetch context applied to every source.
    pub const FETCH_CONTEXT: (&str, &str) = ("FETCH_CONTEXT", "marker");
    /// Permitted page sizes the marker context may request.
    pub const MARKER_ALLOWED_FETCH_NUMBER: (&str, &str) = ("MARKER_ALLOWED_FETCH_NUMBER", "20,200,2000");
    /// Page size the marker context requests.
    pub const MARKER_ACTIVE_FETCH_NUMBER: (&str, &str) = ("MARKER_ACTIVE_FETCH_NUMBER", "20");
    /// Pause between item writes during `split`, in milliseconds.
    pub const SPLIT_THROTTLE_MS: (&str, &str) = ("SPLIT_THROTTLE_MS", "1");
    /// HTTP request timeout in seconds.
    pub const FETCH_TIMEOUT_SECS: (&str, &str) = ("FETCH_TIMEOUT_SECS", "30");
    /// Whether operations take advisory stage locks.
    pub const STAGE_LOCKING: (&str, &str) = ("STAGE_LOCKING", "true");
    /// Age after which a lock file is considered abandoned, in seconds.
    pub const LOCK_STALE_SECS: (&str, &str) = ("LOCK_STALE_SECS", "3600");
}

/// Settings of the marker fetch context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerSettings {
    /// Page sizes the context may request.
    pub allowed_fetch_numbers: AllowSet,
    /// Page size the context requests.
    pub active_fetch_number: usize,
}

/// Read-only configuration for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    /// Root directory holding the stage directories.
    pub storage_root: PathBuf,
    /// Items transformed per `process` call.
    pub max_process_per_cycle: usize,
    /// Permitted top-level item counts of a fetched feed.
    pub allowed_fetch_numbers: AllowSet,
    /// Feed sources, fetched in order.
    pub sources: Vec<FetchSource>,
    /// Marker context settings.
    pub marker: MarkerSettings,
    /// Pause between item writes during `split`.
    pub split_throttle: Duration,
    /// HTTP request timeout.
    pub fetch_timeout: Duration,
    /// Whether operations take advisory stage locks.
    pub stage_locking: bool,
    /// Age after which a lock file is considered abandoned.
    pub lock_stale_after: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from(keys::STORAGE_ROOT.1),
            max_process_per_cycle: 3,
            allowed_fetch_numbers: AllowSet::new([20, 200, 2000]),
            sources: vec![FetchSource::new(keys::FETCH_URLS.1, FetchContext::Marker)],
            marker: MarkerSettings {
                allowed_fetch_numbers: AllowSet::new([20, 200, 2000]),
                active_fetch_number: 20,
            },
            split_throttle: Duration::from_millis(1),
            fetch_timeout: Duration::from_secs(30),
            stage_locking: true,
            lock_stale_after: Duration::from_secs(3600),
        }
    }
}

impl PipelineConfig {
    /// Creates a default configuration rooted at `storage_root`.
    #[must_use]
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] when
    /// `path` is `None`.
    ///
    /// A named file must exist; a missing default file means all defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => Settings::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Settings::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                info!(file = DEFAULT_CONFIG_FILE, "No configuration file found, using defaults");
                Settings::new()
            }
        };
        Self::from_settings(&settings)
    }

    /// Builds the configuration from key/value settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let get = |(key, default): (&'static str, &'static str)| settings.get(key, default);
        let get_usize =
            |(key, default): (&'static str, &'static str)| settings.get_usize(key, default);

        let context: FetchContext = get(keys::FETCH_CONTEXT).parse()?;
        let sources: Vec<FetchSource> = settings
            .get_list(keys::FETCH_URLS.0, keys::FETCH_URLS.1)
            .into_iter()
            .map(|url| FetchSource::new(url, context))
            .collect();
        if sources.is_empty() {
            return Err(FeedflowError::Config("FETCH_URLS lists no sources".into()));
        }

        Ok(Self {
            storage_root: PathBuf::from(get(keys::STORAGE_ROOT)),
            max_process_per_cycle: get_usize(keys::MAX_PROCESS_PER_CYCLE)?,
            allowed_fetch_numbers: get(keys::ALLOWED_FETCH_NUMBER).parse()?,
            sources,
            marker: MarkerSettings {
                allowed_fetch_numbers: get(keys::MARKER_ALLOWED_FETCH_NUMBER).parse()?,
                active_fetch_number: get_usize(keys::MARKER_ACTIVE_FETCH_NUMBER)?,
            },
            split_throttle: Duration::from_millis(get_usize(keys::SPLIT_THROTTLE_MS)? as u64),
            fetch_timeout: Duration::from_secs(get_usize(keys::FETCH_TIMEOUT_SECS)? as u64),
            stage_locking: settings.get_bool(keys::STAGE_LOCKING.0, keys::STAGE_LOCKING.1)?,
            lock_stale_after: Duration::from_secs(get_usize(keys::LOCK_STALE_SECS)? as u64),
        })
    }

    /// Sets the per-cycle item limit.
    #[must_use]
    pub const fn with_max_process_per_cycle(mut self, max: usize) -> Self {
        self.max_process_per_cycle = max;
        self
    }

    /// Sets the feed item count allow-set.
    #[must_use]
    pub fn with_allowed_fetch_numbers(mut self, allowed: AllowSet) -> Self {
        self.allowed_fetch_numbers = allowed;
        self
    }

    /// Replaces the feed sources.
    #[must_use]
    pub fn with_sources(mut self, sources: Vec<FetchSource>) -> Self {
        self.sources = sources;
        self
    }

    /// Sets the pause between item writes during `split`.
    #[must_use]
    pub const fn with_split_throttle(mut self, throttle: Duration) -> Self {
        self.split_throttle = throttle;
        self
    }

    /// Enables or disables stage locking.
    #[must_use]
    pub const fn with_stage_locking(mut self, enabled: bool) -> Self {
        self.stage_locking = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_settings_match_default() {
        let config = PipelineConfig::from_settings(&Settings::new()).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_settings_override_defaults() {
        let settings = Settings::from_toml_str(
            r#"
STORAGE_ROOT = "/var/lib/feedflow"
MAX_PROCESS_PER_CYCLE = 10
ALLOWED_FETCH_NUMBER = "5,50"
FETCH_URLS = ["file:///tmp/a.xml", "http://example.com/b.xml"]
FETCH_CONTEXT = "plain"
MARKER_ACTIVE_FETCH_NUMBER = 200
SPLIT_THROTTLE_MS = 0
STAGE_LOCKING = "off"
"#,
        )
        .unwrap();
        let config = PipelineConfig::from_settings(&settings).unwrap();

        assert_eq!(config.storage_root, PathBuf::from("/var/lib/feedflow"));
        assert_eq!(config.max_process_per_cycle, 10);
        assert_eq!(config.allowed_fetch_numbers, AllowSet::new([5, 50]));
        assert_eq!(config.sources.len(), 2);
        assert!(config.sources.iter().all(|s| s.context == FetchContext::Plain));
        assert_eq!(config.marker.active_fetch_number, 200);
        assert_eq!(config.split_throttle, Duration::ZERO);
        assert!(!config.stage_locking);
    }

    #[test]
    fn test_feed_and_marker_allow_sets_are_independent() {
        let settings = Settings::new().with("ALLOWED_FETCH_NUMBER", "3");
        let config = PipelineConfig::from_settings(&settings).unwrap();

        assert_eq!(config.allowed_fetch_numbers, AllowSet::new([3]));
        assert_eq!(config.marker.allowed_fetch_numbers, AllowSet::new([20, 200, 2000]));
    }

    #[test]
    fn test_unknown_fetch_context_is_rejected() {
        let settings = Settings::new().with("FETCH_CONTEXT", "soap");
        assert!(matches!(
            PipelineConfig::from_settings(&settings),
            Err(FeedflowError::Config(_))
        ));
    }

    #[test]
    fn test_missing_named_file_is_rejected() {
        let missing = Path::new("/nonexistent/feedflow.toml");
        assert!(PipelineConfig::load(Some(missing)).is_err());
    }
}
