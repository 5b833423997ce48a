//! Allow-sets of integer counts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::FeedflowError;

/// A set of permitted counts, written as `20,200,2000`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowSet(BTreeSet<usize>);

impl AllowSet {
    /// Creates an allow-set from the given counts.
    #[must_use]
    pub fn new(counts: impl IntoIterator<Item = usize>) -> Self {
        Self(counts.into_iter().collect())
    }

    /// Whether `count` is permitted.
    #[must_use]
    pub fn contains(&self, count: usize) -> bool {
        self.0.contains(&count)
    }

    /// The permitted counts in ascending order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<usize> {
        self.0.iter().copied().collect()
    }
}

impl FromStr for AllowSet {
    type Err = FeedflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                entry.parse::<usize>().map_err(|_| {
                    FeedflowError::Config(format!("invalid allow-set entry '{entry}' in '{s}'"))
                })
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for AllowSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&joined.join(","))
    }
}
