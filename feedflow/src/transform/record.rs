//! The structured record produced from one item.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Title and description in one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    /// Localized title.
    pub title: String,
    /// Localized description.
    pub description: String,
}

impl LocalizedText {
    /// Creates a new localized pair.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// One transformed item: product attributes plus per-language text.
///
/// Records are immutable once built; maps are kept in key order so the
/// encoded form is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    product: BTreeMap<String, String>,
    #[serde(default)]
    description: BTreeMap<String, LocalizedText>,
}

impl Record {
    /// Creates a record from its two mappings.
    #[must_use]
    pub const fn new(
        product: BTreeMap<String, String>,
        description: BTreeMap<String, LocalizedText>,
    ) -> Self {
        Self {
            product,
            description,
        }
    }

    /// Product attribute name to value.
    #[must_use]
    pub const fn product(&self) -> &BTreeMap<String, String> {
        &self.product
    }

    /// Language code to localized text.
    #[must_use]
    pub const fn description(&self) -> &BTreeMap<String, LocalizedText> {
        &self.description
    }

    /// Localized text for `lang`.
    #[must_use]
    pub fn localized(&self, lang: &str) -> Option<&LocalizedText> {
        self.description.get(lang)
    }
}
