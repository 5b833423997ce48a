//! Record transformation.
//!
//! Turns one item document into a [`Record`].

mod convert;
mod record;

pub use convert::{convert, convert_element, LANG_ATTRIBUTE};
pub use record::{LocalizedText, Record};
