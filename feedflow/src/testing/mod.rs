//! Testing utilities for feedflow pipelines.
//!
//! This module provides:
//! - Feed and item document fixtures
//! - Fetchers that serve canned content or fail on demand

mod fixtures;
mod mocks;

pub use fixtures::{feed_xml, item_xml, test_config, TEST_SOURCE};
pub use mocks::{FailingFetcher, StaticFetcher};
