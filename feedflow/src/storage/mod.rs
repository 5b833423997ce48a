//! Directory-backed stage storage.
//!
//! This module provides:
//! - Stage and extension names with validation at the string boundary
//! - Collision-free item naming
//! - The [`StageStore`] trait and its file-system implementation
//! - Advisory per-stage locks

mod item;
mod lock;
mod stage;
mod store;

pub use item::{ItemName, StagedItem};
pub use lock::StageLock;
pub use stage::{Extension, Stage};
pub use store::{FsStageStore, StageStore};
