//! The pipeline controller.
//!
//! This module provides:
//! - [`Pipeline`], which drives fetch, split and process over a stage store
//! - Reports describing what each operation did

mod controller;
mod report;
#[cfg(test)]
mod integration_tests;

pub use controller::{open, Pipeline};
pub use report::{FetchReport, FetchedSource, ProcessReport, SplitReport, StageCount, StatusReport};
