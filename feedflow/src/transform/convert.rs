//! Item document to record conversion.

use std::collections::BTreeMap;

use super::record::{LocalizedText, Record};
use crate::document::XmlElement;
use crate::errors::Result;

/// Attribute that marks a child element as a localized entry.
pub const LANG_ATTRIBUTE: &str = "lang";

/// Parses one item document and converts it into a [`Record`].
///
/// Fails only when the document is not well-formed.
pub fn convert(document: &str) -> Result<Record> {
    let root = XmlElement::parse(document)?;
    Ok(convert_element(&root))
}

/// Converts an already parsed item root into a [`Record`].
///
/// Root attributes become the product mapping. A direct child whose first
/// attribute is `lang` contributes its `title` and `description` text under
/// that language; any other child is ignored.
#[must_use]
pub fn convert_element(root: &XmlElement) -> Record {
    let product: BTreeMap<String, String> = root.attributes.iter().cloned().collect();

    let mut description = BTreeMap::new();
    for child in &root.children {
        let Some((LANG_ATTRIBUTE, lang)) = child.first_attribute() else {
            continue;
        };
        description.insert(
            lang.to_string(),
            LocalizedText::new(child.child_text("title"), child.child_text("description")),
        );
    }

    Record::new(product, description)
}
