//! The result container.
//!
//! This module provides:
//! - The versioned container encoding
//! - The accumulator that merges new records into the single container

mod accumulator;
mod codec;

pub use accumulator::{ExistingResults, MergeOutcome, ResultAccumulator};
pub use codec::{decode, encode, RESULTS_FORMAT, RESULTS_VERSION};
