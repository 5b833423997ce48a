//! XML document handling built on `quick-xml`.
//!
//! Only what the pipeline needs: an owned element tree with well-formedness
//! checks, top-level item counting and splitting a feed into item fragments.

mod split;
mod tree;

pub use split::{count_items, split_children};
pub use tree::XmlElement;
